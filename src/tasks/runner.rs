//! Periodic execution of a task body at a fixed nominal rate.
//!
//! One runner per OS thread. Each activation runs to completion: the stop
//! token is consulted only at the top of the loop, so a monitor
//! acquire/transform/release sequence is never abandoned half-way and no
//! record is left partially updated.

use log::{debug, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thread_priority::{ThreadPriority, ThreadPriorityValue, set_current_thread_priority};

use crate::state::monitor::LockTag;
use crate::tasks::timing::{SampleKind, TimingLog};

/// Cooperative cancellation token shared by every task of a run.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of one activation body.
pub enum TaskVerdict {
    Continue,
    /// The task cannot usefully continue (e.g. its log file died); the
    /// runner triggers the global stop and exits.
    Shutdown,
}

/// Static description of a periodic task: identity, rate, the monitors it
/// acquires (in global order) and how its timing is sampled.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub name: &'static str,
    pub period: Duration,
    /// Declared acquisition list, ascending in the global lock order;
    /// validated by the orchestrator before launch.
    pub locks: &'static [LockTag],
    pub sample_kind: SampleKind,
    pub sample_capacity: usize,
    /// Best-effort static thread priority; `None` leaves the OS default.
    pub priority: Option<u8>,
}

/// Sleep-until-next-activation strategy, abstracted so tests can run the
/// loop without wall-clock delay.
pub trait Pacer: Send {
    /// Pace after an activation that started at `activation_start`. Must not
    /// sleep at all when the activation overran its period: the next
    /// activation starts immediately, with no catch-up for lost cycles.
    fn pace(&mut self, activation_start: Instant, period: Duration);
}

/// Default pacer: a spin-assisted sleeper for low wake-up jitter.
pub struct SpinPacer {
    sleeper: SpinSleeper,
}

impl SpinPacer {
    pub fn new() -> Self {
        Self {
            sleeper: SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread),
        }
    }
}

impl Default for SpinPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for SpinPacer {
    fn pace(&mut self, activation_start: Instant, period: Duration) {
        let elapsed = activation_start.elapsed();
        if elapsed < period {
            self.sleeper.sleep(period - elapsed);
        }
    }
}

/// A periodic task bound to a stop token and a pacer.
pub struct PeriodicTask<P: Pacer = SpinPacer> {
    descriptor: TaskDescriptor,
    stop: StopToken,
    pacer: P,
}

impl PeriodicTask<SpinPacer> {
    pub fn new(descriptor: TaskDescriptor, stop: StopToken) -> Self {
        Self::with_pacer(descriptor, stop, SpinPacer::new())
    }
}

impl<P: Pacer> PeriodicTask<P> {
    pub fn with_pacer(descriptor: TaskDescriptor, stop: StopToken, pacer: P) -> Self {
        Self {
            descriptor,
            stop,
            pacer,
        }
    }

    /// Runs `body` once per nominal period until the stop token trips, then
    /// prints this task's statistics and returns the sample log.
    ///
    /// Per activation: sample the period gap (Period tasks), run the body,
    /// sample the elapsed computation time (Computation tasks), then sleep
    /// the remainder of the period. An overrunning activation skips the
    /// sleep entirely.
    pub fn run<F>(mut self, mut body: F) -> TimingLog
    where
        F: FnMut() -> TaskVerdict,
    {
        apply_priority(&self.descriptor);
        debug!(
            "[{}] started, period {:?}",
            self.descriptor.name, self.descriptor.period
        );

        let mut log = TimingLog::new(self.descriptor.sample_kind, self.descriptor.sample_capacity);
        let mut last_activation = Instant::now();

        while !self.stop.is_triggered() {
            let start = Instant::now();
            if self.descriptor.sample_kind == SampleKind::Period {
                log.push(duration_ms(start.duration_since(last_activation)));
            }
            last_activation = start;

            let verdict = body();

            if self.descriptor.sample_kind == SampleKind::Computation {
                log.push(duration_ms(start.elapsed()));
            }

            match verdict {
                TaskVerdict::Continue => self.pacer.pace(start, self.descriptor.period),
                TaskVerdict::Shutdown => {
                    warn!("[{}] requested global shutdown", self.descriptor.name);
                    self.stop.trigger();
                    break;
                }
            }
        }

        debug!("[{}] stopped after {} samples", self.descriptor.name, log.len());
        if let Some(stats) = log.report(duration_ms(self.descriptor.period)) {
            match self.descriptor.sample_kind {
                SampleKind::Period => stats.print_period_table(self.descriptor.name),
                SampleKind::Computation => stats.print_computation_summary(self.descriptor.name),
            }
        }
        log
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

fn apply_priority(descriptor: &TaskDescriptor) {
    let Some(raw) = descriptor.priority else {
        return;
    };
    match ThreadPriorityValue::try_from(raw) {
        Ok(value) => {
            if let Err(e) = set_current_thread_priority(ThreadPriority::Crossplatform(value)) {
                warn!(
                    "[{}] could not apply thread priority {}: {:?}",
                    descriptor.name, raw, e
                );
            }
        }
        Err(e) => warn!(
            "[{}] invalid thread priority {}: {:?}",
            descriptor.name, raw, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pacer that never sleeps; lets loop tests run at full speed.
    struct NoopPacer;

    impl Pacer for NoopPacer {
        fn pace(&mut self, _activation_start: Instant, _period: Duration) {}
    }

    fn descriptor(kind: SampleKind) -> TaskDescriptor {
        TaskDescriptor {
            name: "test-task",
            period: Duration::from_millis(10),
            locks: &[],
            sample_kind: kind,
            sample_capacity: 700,
            priority: None,
        }
    }

    #[test]
    fn pre_triggered_stop_runs_no_activation() {
        let stop = StopToken::new();
        stop.trigger();
        let mut activations = 0;
        let log = PeriodicTask::with_pacer(descriptor(SampleKind::Computation), stop, NoopPacer)
            .run(|| {
                activations += 1;
                TaskVerdict::Continue
            });
        assert_eq!(activations, 0);
        assert!(log.is_empty());
    }

    #[test]
    fn shutdown_verdict_trips_the_shared_token() {
        let stop = StopToken::new();
        let mut activations = 0;
        PeriodicTask::with_pacer(descriptor(SampleKind::Computation), stop.clone(), NoopPacer)
            .run(|| {
                activations += 1;
                TaskVerdict::Shutdown
            });
        assert_eq!(activations, 1);
        assert!(stop.is_triggered());
    }

    #[test]
    fn period_kind_samples_one_gap_per_activation() {
        let stop = StopToken::new();
        let mut remaining = 4;
        let log = PeriodicTask::with_pacer(descriptor(SampleKind::Period), stop, NoopPacer)
            .run(|| {
                remaining -= 1;
                if remaining == 0 {
                    TaskVerdict::Shutdown
                } else {
                    TaskVerdict::Continue
                }
            });
        assert_eq!(log.kind(), SampleKind::Period);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn activation_count_tracks_duration_over_period() {
        // 25 ms period over a 250 ms run: floor(D/P) = 10 activations,
        // give or take scheduler granularity. The upper bound is strict
        // (sleep-based pacing cannot run fast), the lower bound is loose
        // for heavily loaded test machines.
        let stop = StopToken::new();
        {
            let stop = stop.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(250));
                stop.trigger();
            });
        }
        let mut desc = descriptor(SampleKind::Computation);
        desc.period = Duration::from_millis(25);
        let log = PeriodicTask::new(desc, stop).run(|| TaskVerdict::Continue);
        assert!(log.len() <= 13, "too many activations: {}", log.len());
        assert!(log.len() >= 4, "too few activations: {}", log.len());
    }
}
