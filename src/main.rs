//! Entry point: one experiment per invocation.
//!
//! `robot_rts [--load]`: the flag launches the synthetic CPU-load thread
//! and switches the trajectory log to the with-load file name; the control
//! loop itself is identical in both modes.

use log::error;
use std::env;
use std::process::ExitCode;

use robot_rts::orchestrator::{SimConfig, run_simulation};

fn main() -> ExitCode {
    env_logger::init();

    let with_load = env::args().skip(1).any(|arg| arg == "--load");
    println!(
        "Running simulation {} synthetic CPU load.",
        if with_load { "WITH" } else { "WITHOUT" }
    );

    let cfg = SimConfig {
        with_load,
        ..SimConfig::default()
    };

    match run_simulation(&cfg) {
        Ok(()) => {
            println!("Simulation finished successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("initialization failed: {}", e);
            eprintln!("initialization failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
