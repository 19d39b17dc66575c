#![no_main]

//! Fuzz target for concurrent container operations
//!
//! Many threads resolving the same singletons must observe one activation
//! and one shared instance per service.

use arbitrary::Arbitrary;
use idiocy::{Component, Container};
use libfuzzer_sys::fuzz_target;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

static CONFIG_ACTIVATIONS: AtomicUsize = AtomicUsize::new(0);

struct SharedConfig;

impl Component for SharedConfig {
    type Dependencies = ();

    fn construct(_: ()) -> Self {
        CONFIG_ACTIVATIONS.fetch_add(1, Ordering::SeqCst);
        SharedConfig
    }
}

struct Worker {
    config: Arc<SharedConfig>,
}

impl Component for Worker {
    type Dependencies = Arc<SharedConfig>;

    fn construct(config: Arc<SharedConfig>) -> Self {
        Worker { config }
    }
}

/// Thread operation
#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    ResolveConfig,
    ResolveWorker,
    TryResolveWorker,
    Contains,
    RegisterWorker,
}

/// Concurrent test scenario
#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    // Number of threads (clamped to 1-8)
    thread_count: u8,
    // Operations per thread (clamped)
    ops_per_thread: Vec<ThreadOp>,
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let container = Container::new();
    container.singleton::<SharedConfig, SharedConfig>().unwrap();

    let before = CONFIG_ACTIVATIONS.load(Ordering::SeqCst);

    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops = &scenario.ops_per_thread;
    let barrier = Barrier::new(thread_count);

    let seen: Vec<Vec<Arc<SharedConfig>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let container = container.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    let mut seen = Vec::new();
                    barrier.wait();

                    for op in ops.iter().take(50) {
                        match op {
                            ThreadOp::ResolveConfig => {
                                seen.push(container.resolve::<SharedConfig>().unwrap());
                            }
                            ThreadOp::ResolveWorker => {
                                if let Ok(worker) = container.resolve::<Worker>() {
                                    seen.push(Arc::clone(&worker.config));
                                }
                            }
                            ThreadOp::TryResolveWorker => {
                                let _ = container.try_resolve::<Worker>();
                            }
                            ThreadOp::Contains => {
                                let _ = container.contains::<Worker>();
                            }
                            ThreadOp::RegisterWorker => {
                                // Racing registrations: at most one succeeds
                                let _ = container.transient::<Worker, Worker>();
                            }
                        }
                    }

                    seen
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let all: Vec<_> = seen.into_iter().flatten().collect();
    if let Some(first) = all.first() {
        assert!(all.iter().all(|config| Arc::ptr_eq(config, first)));
        assert_eq!(CONFIG_ACTIVATIONS.load(Ordering::SeqCst) - before, 1);
    }

    assert!(container.len() <= 2);
});
