//! Operator-facing task: console rendering, trajectory logging, live gain
//! updates.
//!
//! This is the one stage sampled by period (for the jitter table) rather
//! than by computation time, and the only place operator input mutates
//! shared state after startup. Input never blocks the loop: a detached
//! reader thread forwards stdin lines over a bounded channel and the task
//! polls it with `try_recv` once per activation.

use crossbeam::channel::{Receiver, TrySendError, bounded};
use log::{error, info};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::state::gains::Gains;
use crate::state::monitor::{LockTag, Monitor};
use crate::state::reference::ReferencePoint;
use crate::state::robot::RobotState;
use crate::tasks::runner::{TaskDescriptor, TaskVerdict};
use crate::tasks::timing::SampleKind;

pub const UI_LOCKS: &[LockTag] = &[LockTag::Gains, LockTag::Reference, LockTag::Robot];

/// One persisted line per logging activation; space-delimited by the writer
/// configuration, field names become the header row.
#[derive(Debug, Serialize)]
struct TrajectoryRow {
    t: f64,
    xc: f64,
    yc: f64,
    theta: f64,
    xref: f64,
    yref: f64,
}

/// Forwards stdin lines to a bounded channel from a detached thread.
/// Excess lines are dropped rather than ever blocking the reader; the
/// thread ends when stdin closes or the receiving task goes away.
pub fn spawn_gain_input_reader() -> Receiver<String> {
    let (tx, rx) = bounded(8);
    let spawned = thread::Builder::new()
        .name("gain-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if let Err(TrySendError::Disconnected(_)) = tx.try_send(line) {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        error!("could not spawn stdin reader: {}", e);
    }
    rx
}

/// A receiver that never yields anything, for headless runs.
pub fn silent_gain_input() -> Receiver<String> {
    let (_tx, rx) = bounded(1);
    rx
}

/// A gain-update line is exactly two whitespace-separated floats; anything
/// else is discarded without touching shared state.
fn parse_gain_pair(line: &str) -> Option<(f64, f64)> {
    let mut fields = line.split_whitespace();
    let alpha1 = fields.next()?.parse().ok()?;
    let alpha2 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((alpha1, alpha2))
}

fn render(t_s: f64, row: &TrajectoryRow, gains: Gains) {
    // Full-screen redraw: clear, home, repaint.
    print!("\x1b[2J\x1b[H");
    println!("--- Robot Control-Loop Simulation ---");
    println!("Time: {:.2} s", t_s);
    println!();
    println!("Robot pose:");
    println!("  Xc:    {:+7.3} m", row.xc);
    println!("  Yc:    {:+7.3} m", row.yc);
    println!("  Theta: {:+7.3} rad", row.theta);
    println!();
    println!("Reference:");
    println!("  Xref:  {:+7.3} m", row.xref);
    println!("  Yref:  {:+7.3} m", row.yref);
    println!();
    println!("Controller gains:");
    println!("  alpha1: {:.2}", gains.alpha1);
    println!("  alpha2: {:.2}", gains.alpha2);
    println!();
    println!(">>> enter new gains as two numbers (e.g. 1.5 2.5) and press Enter:");
    let _ = io::stdout().flush();
}

fn write_row(writer: &mut csv::Writer<File>, row: &TrajectoryRow) -> csv::Result<()> {
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}

/// Builds the UI/logging stage. The trajectory writer is opened by the
/// orchestrator (open failure is a startup error); a write failure during
/// the run makes this task request global shutdown, and the remaining
/// tasks wind down at their next stop check.
pub fn ui_logging(
    gains: Arc<Monitor<Gains>>,
    reference: Arc<Monitor<ReferencePoint>>,
    robot: Arc<Monitor<RobotState>>,
    period: Duration,
    capacity: usize,
    mut writer: csv::Writer<File>,
    gain_input: Receiver<String>,
    console: bool,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let period_s = period.as_secs_f64();
    let mut t_s = 0.0;

    let body = move || {
        let (row, current_gains) = {
            let g = gains.lock();
            let p = reference.lock();
            let r = robot.lock();
            (
                TrajectoryRow {
                    t: t_s,
                    xc: r.x[(0, 0)],
                    yc: r.x[(1, 0)],
                    theta: r.x[(2, 0)],
                    xref: p.ref_xy[(0, 0)],
                    yref: p.ref_xy[(1, 0)],
                },
                *g,
            )
        };

        if console {
            render(t_s, &row, current_gains);
        }

        if let Err(e) = write_row(&mut writer, &row) {
            error!("trajectory log write failed: {}", e);
            return TaskVerdict::Shutdown;
        }

        if let Ok(line) = gain_input.try_recv() {
            if let Some((alpha1, alpha2)) = parse_gain_pair(&line) {
                let mut g = gains.lock();
                g.alpha1 = alpha1;
                g.alpha2 = alpha2;
                info!("gains updated: alpha1={:.2} alpha2={:.2}", alpha1, alpha2);
            }
        }

        t_s += period_s;
        TaskVerdict::Continue
    };

    (
        TaskDescriptor {
            name: "ui-log",
            period,
            locks: UI_LOCKS,
            sample_kind: SampleKind::Period,
            sample_capacity: capacity,
            priority: Some(40),
        },
        body,
    )
}
