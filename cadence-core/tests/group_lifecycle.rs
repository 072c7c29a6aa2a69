//! End-to-end lifecycle tests for the open-model group
//!
//! Workers here are deliberately trivial: they record launch instants and
//! cancellation observations so the tests can assert on scheduling and
//! lifecycle behavior without any real protocol underneath.

use async_trait::async_trait;
use cadence_core::{timing, OpenModelConfig, OpenModelGroup, Worker, WorkerContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Records its launch instant and returns immediately
struct RecordingWorker {
    name: String,
    launches: Arc<Mutex<Vec<u64>>>,
}

#[async_trait]
impl Worker for RecordingWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: WorkerContext) {
        if let Ok(mut launches) = self.launches.lock() {
            launches.push(timing::time_ns());
        }
    }
}

/// Loops at a checkpoint pace until stopped or past the deadline
struct LoopingWorker {
    name: String,
    iterations: Arc<AtomicUsize>,
    stops_seen: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker for LoopingWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: WorkerContext) {
        while ctx.idle(Duration::from_millis(20)).await {
            self.iterations.fetch_add(1, Ordering::SeqCst);
        }
        self.stops_seen.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registers an interrupt hook, then sleeps far past the schedule end
struct StragglingWorker {
    name: String,
    interrupted: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker for StragglingWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: WorkerContext) {
        let interrupted = self.interrupted.clone();
        ctx.cancel().on_interrupt(move || {
            interrupted.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(600)).await;
    }
}

#[test]
fn test_even_schedule_launches_expected_workers() {
    init_tracing();
    let launches = Arc::new(Mutex::new(Vec::new()));
    let group = OpenModelGroup::new(OpenModelConfig::new(
        "rate(50/sec) even_arrivals(200 ms)",
    ))
    .unwrap();

    let factory_launches = launches.clone();
    group
        .start(move |index| {
            Arc::new(RecordingWorker {
                name: format!("recording-{index}"),
                launches: factory_launches.clone(),
            }) as Arc<dyn Worker>
        })
        .unwrap();

    assert!(group.wait_finished(Duration::from_secs(10)), "schedule did not finish");
    assert!(wait_until(|| group.active_workers() == 0, Duration::from_secs(5)));

    // 50/sec over 200 ms = 10 arrivals
    let recorded = launches.lock().unwrap();
    assert_eq!(recorded.len(), 10);
    // Launches are ordered; first-to-last span roughly matches the window
    for pair in recorded.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    let span = recorded.last().unwrap() - recorded.first().unwrap();
    assert!(span >= 100_000_000, "span only {span} ns; launches bunched up");
    assert!(span < 2_000_000_000, "span {span} ns; launches drifted badly");
}

#[test]
fn test_graceful_stop_observed_at_checkpoints() {
    init_tracing();
    let iterations = Arc::new(AtomicUsize::new(0));
    let stops_seen = Arc::new(AtomicUsize::new(0));
    // Three workers launched within 100 ms, then a long idle tail keeps the
    // schedule formally running until we stop it
    let group = OpenModelGroup::new(OpenModelConfig::new(
        "rate(30/sec) even_arrivals(100 ms) pause(10 min)",
    ))
    .unwrap();

    let factory_iterations = iterations.clone();
    let factory_stops = stops_seen.clone();
    group
        .start(move |index| {
            Arc::new(LoopingWorker {
                name: format!("looping-{index}"),
                iterations: factory_iterations.clone(),
                stops_seen: factory_stops.clone(),
            }) as Arc<dyn Worker>
        })
        .unwrap();

    assert!(wait_until(|| group.active_workers() == 3, Duration::from_secs(5)));
    assert!(wait_until(
        || iterations.load(Ordering::SeqCst) >= 3,
        Duration::from_secs(5)
    ));

    group.stop();
    assert!(
        wait_until(|| stops_seen.load(Ordering::SeqCst) == 3, Duration::from_secs(5)),
        "workers did not observe the stop flag"
    );
    assert!(wait_until(|| group.active_workers() == 0, Duration::from_secs(5)));
    assert!(group.wait_finished(Duration::from_secs(1)));

    // Repeated stops and closes are no-ops
    group.stop();
    group.close();
    group.close();
}

#[test]
fn test_stragglers_interrupted_at_schedule_end() {
    init_tracing();
    let interrupted = Arc::new(AtomicUsize::new(0));
    let group = OpenModelGroup::new(OpenModelConfig::new(
        "rate(10/sec) even_arrivals(300 ms)",
    ))
    .unwrap();

    let factory_interrupted = interrupted.clone();
    group
        .start(move |index| {
            Arc::new(StragglingWorker {
                name: format!("straggler-{index}"),
                interrupted: factory_interrupted.clone(),
            }) as Arc<dyn Worker>
        })
        .unwrap();

    assert!(group.wait_finished(Duration::from_secs(10)), "schedule did not finish");
    // 10/sec over 300 ms = 3 stragglers, all force-interrupted at the end
    assert!(
        wait_until(
            || interrupted.load(Ordering::SeqCst) == 3,
            Duration::from_secs(5)
        ),
        "interrupt hooks did not fire: {}",
        interrupted.load(Ordering::SeqCst)
    );
    assert!(wait_until(|| group.active_workers() == 0, Duration::from_secs(5)));
}

#[test]
fn test_malformed_schedule_fails_before_launch() {
    init_tracing();
    let err = OpenModelGroup::new(OpenModelConfig::new("rate(5)")).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("offset"), "error must carry a position: {text}");
}

#[test]
fn test_interrupt_all_cancels_midway() {
    init_tracing();
    let launched = Arc::new(AtomicUsize::new(0));
    let group = OpenModelGroup::new(OpenModelConfig::new(
        "rate(5/sec) even_arrivals(60 s)",
    ))
    .unwrap();

    let factory_launched = launched.clone();
    group
        .start(move |index| {
            factory_launched.fetch_add(1, Ordering::SeqCst);
            Arc::new(StragglingWorker {
                name: format!("cancelled-{index}"),
                interrupted: Arc::new(AtomicUsize::new(0)),
            }) as Arc<dyn Worker>
        })
        .unwrap();

    assert!(wait_until(
        || launched.load(Ordering::SeqCst) >= 2,
        Duration::from_secs(10)
    ));
    group.interrupt_all();
    let after = launched.load(Ordering::SeqCst);
    assert_eq!(group.active_workers(), 0);
    assert!(group.wait_finished(Duration::from_secs(1)));
    // The driver is cancelled; no further launches happen
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(launched.load(Ordering::SeqCst), after);
}

#[test]
fn test_seeded_runs_share_launch_counts() {
    init_tracing();
    let count_run = |seed: u64| {
        let launched = Arc::new(AtomicUsize::new(0));
        let group = OpenModelGroup::new(
            OpenModelConfig::new("rate(40/sec) random_arrivals(250 ms)").with_seed(seed),
        )
        .unwrap();
        let factory_launched = launched.clone();
        group
            .start(move |index| {
                factory_launched.fetch_add(1, Ordering::SeqCst);
                Arc::new(RecordingWorker {
                    name: format!("seeded-{index}"),
                    launches: Arc::new(Mutex::new(Vec::new())),
                }) as Arc<dyn Worker>
            })
            .unwrap();
        assert!(group.wait_finished(Duration::from_secs(10)));
        launched.load(Ordering::SeqCst)
    };

    // 40/sec over 250 ms floors to 10 arrivals regardless of seed
    assert_eq!(count_run(7), 10);
    assert_eq!(count_run(7), 10);
}
