//! Upload throughput adaptation for adaptive-bitrate streaming
//!
//! This crate provides the periodic estimation engine that turns externally
//! reported counters into a single bounded control signal:
//! - Sample collection from producer threads (bytes sent, buffer depth)
//! - Front-weighted bandwidth estimation
//! - Turndown detection with debounce and pivot tracking
//! - Nonlinear vector synthesis
//! - A background tick loop delivering the signal to a callback

pub mod collector;
pub mod config;
pub mod error;
pub mod estimator;
pub mod models;
pub mod observability;
pub mod scheduler;
pub mod window;

pub use collector::{SampleCollector, SampleSnapshot};
pub use config::AdaptationConfig;
pub use error::{AdaptationError, Result};
pub use estimator::AdaptationEngine;
pub use models::*;
pub use observability::AdaptationMetrics;
pub use scheduler::{SchedulerState, ThroughputAdaptation, ThroughputCallback};
pub use window::BoundedWindow;
