//! Shared state: monitor-guarded records and their pure transforms.

pub mod controller;
pub mod gains;
pub mod monitor;
pub mod ref_model;
pub mod reference;
pub mod robot;
pub mod store;

pub use monitor::{LockTag, Monitor, validate_acquisition_order};
pub use store::SharedStore;
