//! Experiment sequencing: build the store, launch the tasks, run for a
//! fixed wall-clock duration, stop and join.

use log::{debug, error, info};
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::state::monitor::validate_acquisition_order;
use crate::state::store::SharedStore;
use crate::tasks::load::spawn_load_thread;
use crate::tasks::runner::{PeriodicTask, StopToken, TaskDescriptor, TaskVerdict};
use crate::tasks::timing::TimingLog;
use crate::tasks::{stages, ui};

/// Nominal period of each control-loop stage. Values are configuration,
/// not algorithmic constants.
#[derive(Debug, Clone)]
pub struct StagePeriods {
    pub robot: Duration,
    pub linearization: Duration,
    pub control: Duration,
    pub ref_model: Duration,
    pub reference: Duration,
    pub ui: Duration,
}

impl Default for StagePeriods {
    fn default() -> Self {
        Self {
            robot: Duration::from_millis(30),
            linearization: Duration::from_millis(40),
            control: Duration::from_millis(50),
            ref_model: Duration::from_millis(50),
            reference: Duration::from_millis(120),
            ui: Duration::from_millis(100),
        }
    }
}

/// Full experiment configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Launch the synthetic CPU-load thread and log under the with-load
    /// file name. Changes nothing about the control-loop topology.
    pub with_load: bool,
    pub duration: Duration,
    pub periods: StagePeriods,
    /// Capacity of every task's timing-sample buffer.
    pub sample_capacity: usize,
    /// Core the load thread pins to; `None` skips pinning.
    pub load_core: Option<usize>,
    /// Full-screen console rendering; disable for scripted runs and tests.
    pub console: bool,
    pub data_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            with_load: false,
            duration: Duration::from_secs(20),
            periods: StagePeriods::default(),
            sample_capacity: 700,
            load_core: Some(0),
            console: true,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl SimConfig {
    /// Trajectory log path, selected purely by the load mode.
    pub fn output_path(&self) -> PathBuf {
        let name = if self.with_load {
            "trajectory_with_load.txt"
        } else {
            "trajectory_no_load.txt"
        };
        self.data_dir.join(name)
    }
}

/// Runs one complete experiment. Errors here are initialization failures
/// only; once the tasks are up, every fault is handled task-locally.
pub fn run_simulation(cfg: &SimConfig) -> Result<(), String> {
    create_dir_all(&cfg.data_dir)
        .map_err(|e| format!("cannot create output directory {:?}: {}", cfg.data_dir, e))?;

    let out_path = cfg.output_path();
    let writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .from_path(&out_path)
        .map_err(|e| format!("cannot create trajectory log {:?}: {}", out_path, e))?;

    let store = SharedStore::new(Default::default());
    let stop = StopToken::new();

    let gain_input = if cfg.console {
        ui::spawn_gain_input_reader()
    } else {
        ui::silent_gain_input()
    };

    let capacity = cfg.sample_capacity;
    let (ui_desc, ui_body) = ui::ui_logging(
        store.gains.clone(),
        store.reference.clone(),
        store.robot.clone(),
        cfg.periods.ui,
        capacity,
        writer,
        gain_input,
        cfg.console,
    );
    let (robot_desc, robot_body) = stages::robot_simulation(
        store.controller.clone(),
        store.robot.clone(),
        cfg.periods.robot,
        capacity,
    );
    let (linear_desc, linear_body) = stages::linearization(
        store.controller.clone(),
        store.robot.clone(),
        cfg.periods.linearization,
        capacity,
    );
    let (control_desc, control_body) = stages::control_law(
        store.controller.clone(),
        store.gains.clone(),
        store.ref_model.clone(),
        store.robot.clone(),
        cfg.periods.control,
        capacity,
    );
    let (model_desc, model_body) = stages::reference_model(
        store.reference.clone(),
        store.ref_model.clone(),
        cfg.periods.ref_model,
        capacity,
    );
    let (ref_desc, ref_body) =
        stages::reference_generation(store.reference.clone(), cfg.periods.reference, capacity);

    for desc in [
        &ui_desc,
        &robot_desc,
        &linear_desc,
        &control_desc,
        &model_desc,
        &ref_desc,
    ] {
        validate_acquisition_order(desc.locks)
            .map_err(|e| format!("task '{}': {}", desc.name, e))?;
    }

    info!(
        "starting control loop: 6 tasks{} for {:?}",
        if cfg.with_load { " + cpu load" } else { "" },
        cfg.duration
    );

    let ui_handle = spawn_stage(ui_desc, stop.clone(), ui_body)?;
    let robot_handle = spawn_stage(robot_desc, stop.clone(), robot_body)?;
    let linear_handle = spawn_stage(linear_desc, stop.clone(), linear_body)?;
    let control_handle = spawn_stage(control_desc, stop.clone(), control_body)?;
    let model_handle = spawn_stage(model_desc, stop.clone(), model_body)?;
    let ref_handle = spawn_stage(ref_desc, stop.clone(), ref_body)?;

    let load_handle = if cfg.with_load {
        Some(
            spawn_load_thread(stop.clone(), cfg.load_core)
                .map_err(|e| format!("failed to spawn load thread: {}", e))?,
        )
    } else {
        None
    };

    thread::sleep(cfg.duration);
    stop.trigger();
    info!("experiment time elapsed, stop signalled; joining tasks");

    // The UI task is joined first so its statistics table is flushed before
    // the other tasks print theirs. The joins are untimed: a task that
    // never re-checks the stop token would hang shutdown, by design.
    join_stage(ui_handle);
    join_stage(robot_handle);
    join_stage(linear_handle);
    join_stage(control_handle);
    join_stage(model_handle);
    join_stage(ref_handle);
    if let Some(handle) = load_handle {
        if handle.join().is_err() {
            error!("[cpu-load] panicked");
        }
    }

    info!("all tasks joined; trajectory persisted to {:?}", out_path);
    Ok(())
}

fn spawn_stage<F>(
    descriptor: TaskDescriptor,
    stop: StopToken,
    body: F,
) -> Result<NamedHandle, String>
where
    F: FnMut() -> TaskVerdict + Send + 'static,
{
    let name = descriptor.name;
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || PeriodicTask::new(descriptor, stop).run(body))
        .map_err(|e| format!("failed to spawn task '{}': {}", name, e))?;
    Ok(NamedHandle { name, handle })
}

struct NamedHandle {
    name: &'static str,
    handle: JoinHandle<TimingLog>,
}

fn join_stage(named: NamedHandle) {
    match named.handle.join() {
        Ok(log) => debug!("[{}] joined, {} timing samples", named.name, log.len()),
        Err(_) => error!("[{}] panicked", named.name),
    }
}
