//! Concurrency discipline under contention: tasks that share monitor pairs
//! and honor the global acquisition order must never deadlock.

use crossbeam::channel::bounded;
use robot_rts::state::SharedStore;
use std::thread;
use std::time::Duration;

/// Two threads hammer the {controller, robot} pair, both acquiring in the
/// prescribed controller-before-robot order, and must finish a fixed
/// iteration budget. Completion is awaited with a timeout so a deadlock
/// fails the test instead of hanging the suite.
#[test]
fn contending_tasks_with_ordered_acquisition_terminate() {
    const ITERATIONS: usize = 20_000;

    let store = SharedStore::new(Default::default());
    let (done_tx, done_rx) = bounded(2);

    let writer = {
        let controller = store.controller.clone();
        let robot = store.robot.clone();
        let done = done_tx.clone();
        thread::spawn(move || {
            for i in 0..ITERATIONS {
                let mut c = controller.lock();
                let mut r = robot.lock();
                c.u_control[(0, 0)] = i as f64;
                r.u[(0, 0)] = c.u_control[(0, 0)];
            }
            done.send("writer").unwrap();
        })
    };

    let reader = {
        let controller = store.controller.clone();
        let robot = store.robot.clone();
        let done = done_tx;
        thread::spawn(move || {
            let mut sum = 0.0;
            for _ in 0..ITERATIONS {
                let c = controller.lock();
                let r = robot.lock();
                sum += c.u_control[(0, 0)] + r.u[(0, 0)];
            }
            assert!(sum >= 0.0);
            done.send("reader").unwrap();
        })
    };

    for _ in 0..2 {
        done_rx
            .recv_timeout(Duration::from_secs(20))
            .expect("threads deadlocked or stalled");
    }
    writer.join().unwrap();
    reader.join().unwrap();
}

/// The UI-style reader set {gains, reference, robot} interleaved with the
/// control-law set {controller, gains, ref_model, robot}: disjoint ranks in
/// a common order, so progress is guaranteed.
#[test]
fn overlapping_lock_sets_make_progress() {
    const ITERATIONS: usize = 10_000;

    let store = SharedStore::new(Default::default());
    let (done_tx, done_rx) = bounded(2);

    let control = {
        let controller = store.controller.clone();
        let gains = store.gains.clone();
        let model = store.ref_model.clone();
        let robot = store.robot.clone();
        let done = done_tx.clone();
        thread::spawn(move || {
            for _ in 0..ITERATIONS {
                let mut c = controller.lock();
                let g = gains.lock();
                let m = model.lock();
                let r = robot.lock();
                c.v_control[(0, 0)] = g.alpha1 * (m.y_m[(0, 0)] - r.y[(0, 0)]);
            }
            done.send(()).unwrap();
        })
    };

    let ui = {
        let gains = store.gains.clone();
        let reference = store.reference.clone();
        let robot = store.robot.clone();
        let done = done_tx;
        thread::spawn(move || {
            let mut last = 0.0;
            for _ in 0..ITERATIONS {
                let g = gains.lock();
                let p = reference.lock();
                let r = robot.lock();
                last = g.alpha1 + p.ref_xy[(0, 0)] + r.x[(0, 0)];
            }
            assert!(last.is_finite());
            done.send(()).unwrap();
        })
    };

    for _ in 0..2 {
        done_rx
            .recv_timeout(Duration::from_secs(20))
            .expect("threads deadlocked or stalled");
    }
    control.join().unwrap();
    ui.join().unwrap();
}
