//! The five numeric control-loop stages, as periodic task bodies.
//!
//! Each builder takes exactly the monitors its stage needs, by `Arc`, and
//! returns the task descriptor plus a closure over those references; no
//! stage can reach state it was not handed. Bodies acquire their monitors
//! in ascending lock-order rank and let guard drop release them in reverse.
//! Stages never call each other: every value crosses task boundaries
//! through a monitor, and a stage reads whatever its upstream wrote last
//! (staleness up to one upstream period is expected).
//!
//! The sixth stage, UI/logging, lives in [`crate::tasks::ui`].

use std::sync::Arc;
use std::time::Duration;

use crate::state::controller::{self, Controller};
use crate::state::gains::Gains;
use crate::state::monitor::{LockTag, Monitor};
use crate::state::ref_model::{self, RefModel};
use crate::state::reference::{self, ReferencePoint};
use crate::state::robot::{self, RobotState};
use crate::tasks::runner::{TaskDescriptor, TaskVerdict};
use crate::tasks::timing::SampleKind;

pub const ROBOT_LOCKS: &[LockTag] = &[LockTag::Controller, LockTag::Robot];
pub const LINEARIZATION_LOCKS: &[LockTag] = &[LockTag::Controller, LockTag::Robot];
pub const CONTROL_LOCKS: &[LockTag] = &[
    LockTag::Controller,
    LockTag::Gains,
    LockTag::RefModel,
    LockTag::Robot,
];
pub const REF_MODEL_LOCKS: &[LockTag] = &[LockTag::Reference, LockTag::RefModel];
pub const REFERENCE_LOCKS: &[LockTag] = &[LockTag::Reference];

fn descriptor(
    name: &'static str,
    period: Duration,
    locks: &'static [LockTag],
    capacity: usize,
    priority: u8,
) -> TaskDescriptor {
    TaskDescriptor {
        name,
        period,
        locks,
        sample_kind: SampleKind::Computation,
        sample_capacity: capacity,
        priority: Some(priority),
    }
}

/// Plant simulation: copy the actuator command, integrate the pose one
/// period forward, refresh the front-point output.
pub fn robot_simulation(
    ctrl: Arc<Monitor<Controller>>,
    robot: Arc<Monitor<RobotState>>,
    period: Duration,
    capacity: usize,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let dt_s = period.as_secs_f64();

    let body = move || {
        let c = ctrl.lock();
        let mut r = robot.lock();
        r.u[(0, 0)] = c.u_control[(0, 0)];
        r.u[(1, 0)] = c.u_control[(1, 0)];
        robot::integrate_pose(&mut r, dt_s);
        robot::update_output(&mut r);
        TaskVerdict::Continue
    };
    (
        descriptor("robot-sim", period, ROBOT_LOCKS, capacity, 80),
        body,
    )
}

/// Feedback linearization: `u = L(θ)⁻¹ · v`.
pub fn linearization(
    ctrl: Arc<Monitor<Controller>>,
    robot: Arc<Monitor<RobotState>>,
    period: Duration,
    capacity: usize,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let body = move || {
        let mut c = ctrl.lock();
        let r = robot.lock();
        controller::apply_linearization(&mut c, &r);
        TaskVerdict::Continue
    };
    (
        descriptor("linearization", period, LINEARIZATION_LOCKS, capacity, 70),
        body,
    )
}

/// Control law: `v = ẏ_m + α ⊙ (y_m − y)` with the live gains.
pub fn control_law(
    ctrl: Arc<Monitor<Controller>>,
    gains: Arc<Monitor<Gains>>,
    model: Arc<Monitor<RefModel>>,
    robot: Arc<Monitor<RobotState>>,
    period: Duration,
    capacity: usize,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let body = move || {
        let mut c = ctrl.lock();
        let g = gains.lock();
        let m = model.lock();
        let r = robot.lock();
        controller::update_command(&mut c, &r, &m, &g);
        TaskVerdict::Continue
    };
    (
        descriptor("control-law", period, CONTROL_LOCKS, capacity, 60),
        body,
    )
}

/// Reference-model integration toward the current reference point.
pub fn reference_model(
    reference: Arc<Monitor<ReferencePoint>>,
    model: Arc<Monitor<RefModel>>,
    period: Duration,
    capacity: usize,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let dt_s = period.as_secs_f64();

    let body = move || {
        let p = reference.lock();
        let mut m = model.lock();
        ref_model::integrate_model(&mut m, &p, dt_s);
        TaskVerdict::Continue
    };
    (
        descriptor("ref-model", period, REF_MODEL_LOCKS, capacity, 55),
        body,
    )
}

/// Reference generation; keeps its own simulation clock, advanced one
/// nominal period per activation.
pub fn reference_generation(
    reference: Arc<Monitor<ReferencePoint>>,
    period: Duration,
    capacity: usize,
) -> (TaskDescriptor, impl FnMut() -> TaskVerdict + Send + 'static) {
    let period_s = period.as_secs_f64();
    let mut t_s = 0.0;

    let body = move || {
        {
            let mut p = reference.lock();
            reference::update_reference(&mut p, t_s);
        }
        t_s += period_s;
        TaskVerdict::Continue
    };
    (
        descriptor("ref-gen", period, REFERENCE_LOCKS, capacity, 30),
        body,
    )
}
