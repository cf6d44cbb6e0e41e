//! # TempVis-RS: simulated temperature time-series engine
//!
//! A real-time engine that produces synthetic temperature readings for a set
//! of channels, keeps a bounded rolling window per channel, and flags values
//! outside per-channel limits. The architecture separates the worker that owns
//! all channel state from the readers that display it.
//!
//! ## Architecture
//!
//! - **Engine**: Owns the channel registry and ticks it in a separate thread
//! - **Window**: Fixed-capacity ring buffer of samples with running statistics
//! - **Snapshots**: Immutable copies published through `arc-swap` after every change
//! - **Communication**: Crossbeam channels for commands and worker messages
//!
//! ## Configuration
//!
//! Engine settings are read from `config.toml` in the platform config
//! directory under `dev.tempvis.tempvis-rs`, or from the file named by the
//! `TEMPVIS_CONFIG` environment variable:
//!
//! - **Linux**: `~/.config/dev.tempvis.tempvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.tempvis.tempvis-rs/`
//! - **Windows**: `%APPDATA%\dev.tempvis.tempvis-rs\`
//!
//! ## Example
//!
//! ```no_run
//! use tempvis_rs::{Engine, EngineConfig};
//!
//! let config = EngineConfig::load_default_location().with_initial_channels(3);
//! let (engine, handle) = Engine::new(config);
//! let worker = engine.spawn().expect("failed to spawn engine thread");
//!
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! for summary in handle.snapshot().summaries() {
//!     println!("{} {:.2} {}", summary.name, summary.current_value, summary.status);
//! }
//!
//! handle.shutdown();
//! worker.join().ok();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{
    ChannelRegistry, Engine, EngineCommand, EngineHandle, EngineMessage, RegistrySnapshot,
};
pub use error::{EngineError, Result};
pub use types::{Channel, LimitStatus, Sample, ThresholdConfig, MAX_WINDOW};
pub use window::SampleWindow;
