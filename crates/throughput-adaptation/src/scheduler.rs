//! Background tick loop
//!
//! [`ThroughputAdaptation`] owns a dedicated thread that wakes once per tick
//! period, drains the sample collector, runs the estimation engine and hands
//! `(vector, pivot_average)` to the registered callback. The thread runs a
//! single-threaded tokio runtime so the inter-tick wait can be interrupted
//! immediately on shutdown.

use crate::collector::SampleCollector;
use crate::config::AdaptationConfig;
use crate::error::{AdaptationError, Result};
use crate::estimator::AdaptationEngine;
use crate::observability::AdaptationMetrics;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Receives `(vector, pivot_average_bytes_per_sec)` once per tick
pub type ThroughputCallback = Arc<dyn Fn(f64, f64) + Send + Sync>;

/// Lifecycle of the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Ticking on schedule
    Running,
    /// Shutdown requested, loop not yet exited
    Exiting,
    /// Loop has exited
    Stopped,
}

/// State shared between producers, the owner handle and the tick loop
struct Shared {
    collector: SampleCollector,
    callback: Mutex<Option<ThroughputCallback>>,
    exiting: AtomicBool,
    stopped: AtomicBool,
    wake: Notify,
}

impl Shared {
    fn callback(&self) -> Option<ThroughputCallback> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_callback(&self, callback: Option<ThroughputCallback>) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }
}

/// Upload throughput estimator with a background tick loop
///
/// Dropping the handle stops the loop and blocks until its thread has exited.
pub struct ThroughputAdaptation {
    shared: Arc<Shared>,
    config: AdaptationConfig,
    thread: Option<JoinHandle<()>>,
}

impl ThroughputAdaptation {
    /// Validate `config` and start the tick loop
    pub fn new(config: AdaptationConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(AdaptationError::Runtime)?;

        let shared = Arc::new(Shared {
            collector: SampleCollector::new(),
            callback: Mutex::new(None),
            exiting: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            wake: Notify::new(),
        });

        let tick_loop = TickLoop {
            shared: Arc::clone(&shared),
            engine: AdaptationEngine::new(&config, Instant::now()),
            period: config.tick_period(),
            metrics: AdaptationMetrics::new(),
        };

        // Keep logging on the loop thread routed to the caller's subscriber
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());

        let thread = std::thread::Builder::new()
            .name("throughput-adaptation".to_string())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || runtime.block_on(tick_loop.run()))
            })
            .map_err(AdaptationError::Spawn)?;

        info!(
            tick_period_ms = config.tick_period_ms,
            bandwidth_samples = config.bandwidth_samples,
            pivot_samples = config.pivot_samples,
            debounce_interval_ms = config.debounce_interval_ms,
            "Started throughput adaptation"
        );

        Ok(Self {
            shared,
            config,
            thread: Some(thread),
        })
    }

    /// Start with the default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(AdaptationConfig::default())
    }

    /// Register the handler invoked after every tick, replacing any previous one
    ///
    /// The handler runs on the sampling thread with no internal lock held. A
    /// slow handler delays the next tick. A panic inside the handler is logged
    /// and the loop keeps ticking.
    pub fn set_throughput_callback<F>(&self, callback: F)
    where
        F: Fn(f64, f64) + Send + Sync + 'static,
    {
        self.shared.set_callback(Some(Arc::new(callback)));
    }

    /// Remove the registered handler; ticks continue without notification
    pub fn clear_throughput_callback(&self) {
        self.shared.set_callback(None);
    }

    /// Report bytes transmitted since the previous report
    pub fn add_sent_bytes_sample(&self, bytes: u64) {
        self.shared.collector.add_sent_bytes_sample(bytes);
    }

    /// Report the current backlog depth
    pub fn add_buffer_size_sample(&self, depth: u64) {
        self.shared.collector.add_buffer_size_sample(depth);
    }

    pub fn state(&self) -> SchedulerState {
        if self.shared.stopped.load(Ordering::Acquire) {
            SchedulerState::Stopped
        } else if self.shared.exiting.load(Ordering::Acquire) {
            SchedulerState::Exiting
        } else {
            SchedulerState::Running
        }
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    /// Stop the tick loop and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shared.exiting.store(true, Ordering::Release);
        // A stored permit covers a loop that is not waiting yet
        self.shared.wake.notify_one();

        if thread.join().is_err() {
            warn!("Sampling thread panicked before shutdown");
        }
        info!("Stopped throughput adaptation");
    }
}

impl Drop for ThroughputAdaptation {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the sampling thread
struct TickLoop {
    shared: Arc<Shared>,
    engine: AdaptationEngine,
    period: Duration,
    metrics: AdaptationMetrics,
}

impl TickLoop {
    async fn run(mut self) {
        debug!(period_ms = self.period.as_millis() as u64, "Tick loop running");
        let _stopped = StoppedGuard(Arc::clone(&self.shared));

        loop {
            if self.shared.exiting.load(Ordering::Acquire) {
                break;
            }

            let now = Instant::now();
            let snapshot = self.shared.collector.drain();
            let report = self.engine.tick(now, &snapshot);
            self.metrics.observe_tick(&report, now.elapsed().as_secs_f64());

            if let Some(callback) = self.shared.callback() {
                let (vector, pivot_average) = (report.vector, report.pivot_average);
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| callback(vector, pivot_average)));
                if outcome.is_err() {
                    warn!(vector, pivot_average, "Throughput callback panicked");
                }
            }

            if self.shared.exiting.load(Ordering::Acquire) {
                break;
            }

            let deadline = tokio::time::Instant::from_std(now + self.period);
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = self.shared.wake.notified() => {
                    debug!("Tick loop woken early");
                }
            }
        }

        debug!("Tick loop exited");
    }
}

/// Marks the loop stopped however `run` exits, unwinding included
struct StoppedGuard(Arc<Shared>);

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        self.0.stopped.store(true, Ordering::Release);
    }
}
