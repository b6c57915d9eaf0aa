//! Closed-loop robot controller simulated as independently-periodic tasks.
//!
//! Six control-loop stages (plant simulation, feedback linearization,
//! control law, reference model, reference generation, UI/logging) run as
//! OS threads at fixed nominal rates, exchanging state only through
//! monitor-guarded shared records. Each task measures its own period or
//! computation time and reports jitter statistics at shutdown, with an
//! optional synthetic CPU-load thread to provoke contention.
//!
//! ## Concurrency model
//! - Every shared record pairs with exactly one lock ([`state::Monitor`]).
//! - Multi-monitor tasks acquire in one global total order and release in
//!   reverse; the order is validated statically at startup and asserted
//!   dynamically in debug builds.
//! - Cancellation is cooperative: a [`tasks::StopToken`] checked once per
//!   activation, so no activation is ever abandoned mid-update.
//! - Pacing is sleep-based best effort: an overrunning activation skips its
//!   sleep, and lost cycles are never replayed.

pub mod matrix;
pub mod orchestrator;
pub mod state;
pub mod tasks;
