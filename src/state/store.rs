//! Construction and ownership of the shared-state store.

use std::sync::Arc;

use crate::state::controller::Controller;
use crate::state::gains::Gains;
use crate::state::monitor::{LockTag, Monitor};
use crate::state::ref_model::RefModel;
use crate::state::reference::ReferencePoint;
use crate::state::robot::RobotState;

/// Every monitor of the simulation. Built once by the orchestrator, which
/// keeps the owning `Arc`s for the whole run; each task clones only the
/// monitors it was given, never the store itself at large.
#[derive(Clone)]
pub struct SharedStore {
    pub robot: Arc<Monitor<RobotState>>,
    pub controller: Arc<Monitor<Controller>>,
    pub reference: Arc<Monitor<ReferencePoint>>,
    pub ref_model: Arc<Monitor<RefModel>>,
    pub gains: Arc<Monitor<Gains>>,
}

impl SharedStore {
    /// All records zero-valued; the reference model captures the initial
    /// gain pair (it does not follow later gain edits).
    pub fn new(initial_gains: Gains) -> Self {
        Self {
            robot: Arc::new(Monitor::new(LockTag::Robot, RobotState::new())),
            controller: Arc::new(Monitor::new(LockTag::Controller, Controller::new())),
            reference: Arc::new(Monitor::new(LockTag::Reference, ReferencePoint::new())),
            ref_model: Arc::new(Monitor::new(
                LockTag::RefModel,
                RefModel::new(initial_gains.alpha1, initial_gains.alpha2),
            )),
            gains: Arc::new(Monitor::new(LockTag::Gains, initial_gains)),
        }
    }
}
