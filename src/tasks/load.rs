//! Synthetic CPU-load generator.
//!
//! An un-paced busy loop with no shared-state access, whose only purpose is
//! to saturate one execution unit so the other tasks' timing tables show
//! the effect of contention. Best-effort pinned to a configured core so the
//! pressure lands where the experiment wants it.

use core_affinity::{get_core_ids, set_for_current};
use log::{debug, info, warn};
use std::hint::black_box;
use std::io;
use std::thread::{self, JoinHandle};

use crate::tasks::runner::StopToken;

pub fn spawn_load_thread(stop: StopToken, pinned_core: Option<usize>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cpu-load".to_string())
        .spawn(move || {
            if let Some(index) = pinned_core {
                let cores = get_core_ids().unwrap_or_default();
                match cores.get(index) {
                    Some(&core) => {
                        if set_for_current(core) {
                            info!("[cpu-load] pinned to core {}", index);
                        } else {
                            warn!("[cpu-load] failed to pin to core {}", index);
                        }
                    }
                    None => warn!("[cpu-load] core {} not available", index),
                }
            }

            let mut x = 0.0f64;
            while !stop.is_triggered() {
                x = black_box(black_box(x).sin());
            }
            debug!("[cpu-load] stopped");
        })
}
