//! Time-series engine for simulated temperature channels
//!
//! This module contains the channel state machinery and the worker that
//! drives it. The worker runs in its own thread and is the only writer of
//! channel state; readers get immutable snapshots.
//!
//! # Architecture
//!
//! - [`EngineCommand`] - Messages sent from the UI to the worker (add, remove, edit limits)
//! - [`EngineMessage`] - Messages sent from the worker to the UI (breaches, stats)
//! - [`EngineHandle`] - UI-side handle for commands, messages, and snapshots
//! - [`Engine`] - Entry point that owns the initial state and runs the worker
//!
//! # Components
//!
//! - [`ChannelFactory`] - Builds channels with backfilled history
//! - [`SampleGenerator`] - Produces the next synthetic reading
//! - [`ChannelRegistry`] - Ordered channel collection with the tick cycle
//! - [`check_limits`] - Classifies a channel's current value
//! - [`SnapshotCell`] - Lock-free handoff of the latest [`RegistrySnapshot`]
//! - [`EngineWorker`] - Main loop that processes commands and ticks on schedule
//!
//! # Example
//!
//! ```no_run
//! use tempvis_rs::config::EngineConfig;
//! use tempvis_rs::engine::{Engine, EngineMessage};
//! use tempvis_rs::types::ThresholdConfig;
//!
//! let (engine, handle) = Engine::new(EngineConfig::default());
//! let worker = engine.spawn().expect("failed to spawn engine thread");
//!
//! let id = handle.add_channel()?;
//! handle.update_thresholds(&id, ThresholdConfig::enabled(Some(25.0), None))?;
//!
//! let snapshot = handle.snapshot();
//! for channel in &snapshot.channels {
//!     println!("{} = {:.1}", channel.name, channel.current_value);
//! }
//!
//! for msg in handle.drain() {
//!     if let EngineMessage::BreachChanged { id, status } = msg {
//!         println!("{} is now {}", id, status);
//!     }
//! }
//!
//! handle.shutdown();
//! worker.join().ok();
//! # Ok::<(), tempvis_rs::EngineError>(())
//! ```

pub mod factory;
pub mod generator;
pub mod limits;
pub mod registry;
pub mod reply;
pub mod snapshot;
pub mod worker;

pub use factory::{create_channel, ChannelFactory, TEMPERATURE_UNIT};
pub use generator::{round2, EntropySource, RandomSource, SampleGenerator, SequenceSource};
pub use limits::{check_limits, evaluate, limit_badge};
pub use registry::{append_sample, ChannelRegistry};
pub use reply::{PendingReply, Reply};
pub use snapshot::{AlignedRow, ChannelSummary, RegistrySnapshot, SnapshotCell, DEFAULT_CHART_ROWS};
pub use worker::EngineWorker;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::types::{now_ms, Channel, EngineStats, LimitStatus, ThresholdConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the handle waits for the worker to answer a request
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Message sent from the UI to the engine worker
///
/// A command carrying a [`Reply`] is applied only if the worker claims it
/// before the reply deadline; otherwise it is rejected with `Timeout`.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Create a channel at the next free index, replying with its id
    AddChannel { reply: Option<Reply<String>> },
    /// Register a prebuilt channel
    InsertChannel {
        channel: Box<Channel>,
        reply: Option<Reply<()>>,
    },
    /// Remove channels by id (unknown ids are ignored)
    RemoveChannels(Vec<String>),
    /// Replace a channel's thresholds
    UpdateThresholds {
        id: String,
        thresholds: ThresholdConfig,
        reply: Option<Reply<()>>,
    },
    /// Set the tick period in milliseconds
    SetTickInterval(u64),
    /// Stop ticking but keep processing commands
    Pause,
    /// Resume ticking
    Resume,
    /// Request current statistics
    RequestStats,
    /// Shutdown the worker
    Shutdown,
}

/// Message sent from the engine worker to the UI
#[derive(Debug, Clone)]
pub enum EngineMessage {
    /// A channel was registered
    ChannelAdded { id: String },
    /// Channels were removed
    ChannelsRemoved(Vec<String>),
    /// A channel's thresholds were replaced
    ThresholdsUpdated { id: String },
    /// A channel's limit status changed
    BreachChanged { id: String, status: LimitStatus },
    /// Statistics update
    Stats(EngineStats),
    /// Worker is shutting down
    Shutdown,
}

/// UI-side handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    /// Receiver for worker messages
    receiver: Receiver<EngineMessage>,
    /// Sender for commands to the worker
    command_sender: Sender<EngineCommand>,
    snapshot: Arc<SnapshotCell>,
    running: Arc<AtomicBool>,
    reply_timeout: Duration,
}

impl EngineHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load()
    }

    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<EngineMessage> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<EngineMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the worker
    pub fn send_command(&self, cmd: EngineCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Set how long request methods wait for the worker
    ///
    /// A request that times out is never applied.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> EngineCommand) -> Result<T> {
        let (reply, pending) = Reply::channel(self.reply_timeout);
        self.command_sender
            .send(make(reply))
            .map_err(|_| EngineError::Channel("engine worker has stopped".to_string()))?;

        pending.wait()
    }

    /// Create a channel at the next free index and return its id
    pub fn add_channel(&self) -> Result<String> {
        self.request(|reply| EngineCommand::AddChannel { reply: Some(reply) })
    }

    /// Register a prebuilt channel; fails with `DuplicateId` if the id is taken
    pub fn insert_channel(&self, channel: Channel) -> Result<()> {
        self.request(|reply| EngineCommand::InsertChannel {
            channel: Box::new(channel),
            reply: Some(reply),
        })
    }

    /// Remove channels by id
    pub fn remove_channels<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        let _ = self.command_sender.send(EngineCommand::RemoveChannels(ids));
    }

    /// Replace a channel's thresholds; fails with `NotFound` if the id is unknown
    pub fn update_thresholds(&self, id: &str, thresholds: ThresholdConfig) -> Result<()> {
        self.request(|reply| EngineCommand::UpdateThresholds {
            id: id.to_string(),
            thresholds,
            reply: Some(reply),
        })
    }

    /// Set the tick period in milliseconds
    pub fn set_tick_interval(&self, interval_ms: u64) {
        let _ = self
            .command_sender
            .send(EngineCommand::SetTickInterval(interval_ms));
    }

    /// Stop ticking
    pub fn pause(&self) {
        let _ = self.command_sender.send(EngineCommand::Pause);
    }

    /// Resume ticking
    pub fn resume(&self) {
        let _ = self.command_sender.send(EngineCommand::Resume);
    }

    /// Ask the worker to publish statistics
    pub fn request_stats(&self) {
        let _ = self.command_sender.send(EngineCommand::RequestStats);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(EngineCommand::Shutdown);
    }

    /// Returns false once the worker has been asked to stop
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The engine: initial state plus the channels to its handle
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) registry: ChannelRegistry,
    pub(crate) rng: Box<dyn RandomSource>,
    pub(crate) command_receiver: Receiver<EngineCommand>,
    pub(crate) message_sender: Sender<EngineMessage>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) snapshot: Arc<SnapshotCell>,
}

impl Engine {
    /// Create an engine drawing randomness from the OS
    pub fn new(config: EngineConfig) -> (Self, EngineHandle) {
        Self::with_random(config, Box::new(EntropySource::new()))
    }

    /// Create an engine with a custom random source
    ///
    /// The initial channels are created immediately, so the handle's first
    /// snapshot already contains them.
    pub fn with_random(config: EngineConfig, mut rng: Box<dyn RandomSource>) -> (Self, EngineHandle) {
        let (cmd_tx, cmd_rx) = bounded(config.tick.command_buffer_size.max(1));
        // Bounded for backpressure; the worker drops messages instead of blocking
        let (msg_tx, msg_rx) = bounded(config.tick.message_buffer_size.max(1));

        let factory = ChannelFactory::new(config.generator, config.backfill);
        let mut registry = ChannelRegistry::with_generator(SampleGenerator::new(config.generator));
        let now = now_ms();
        for index in 0..config.channels.initial_count {
            if let Err(e) = registry.add(factory.create(index, now, rng.as_mut())) {
                tracing::warn!("Skipping initial channel {}: {}", index, e);
            }
        }

        let snapshot = Arc::new(SnapshotCell::new(registry.snapshot(0)));
        let running = Arc::new(AtomicBool::new(true));

        let handle = EngineHandle {
            receiver: msg_rx,
            command_sender: cmd_tx,
            snapshot: snapshot.clone(),
            running: running.clone(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        };

        let engine = Self {
            config,
            registry,
            rng,
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running,
            snapshot,
        };

        (engine, handle)
    }

    /// Run the worker loop on the current thread until shutdown
    pub fn run(self) {
        let mut worker = EngineWorker::new(self);
        worker.run();
    }

    /// Run the worker loop on a dedicated thread
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("tempvis-engine".to_string())
            .spawn(move || self.run())
    }

    /// Get a handle to stop the worker
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EngineConfig {
        EngineConfig::default().with_initial_channels(2)
    }

    #[test]
    fn test_engine_creation() {
        let (engine, handle) = Engine::new(test_config());

        assert!(engine.stop_handle().load(Ordering::SeqCst));
        assert!(handle.is_running());

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("channel_1").is_some());
    }

    #[test]
    fn test_handle_commands_queue() {
        let (engine, handle) = Engine::new(test_config());

        handle.pause();
        handle.resume();
        handle.set_tick_interval(50);
        handle.remove_channels(["channel_0"]);
        handle.request_stats();
        handle.shutdown();

        let queued: Vec<EngineCommand> = engine.command_receiver.try_iter().collect();
        assert_eq!(queued.len(), 6);
        assert!(matches!(queued.last(), Some(EngineCommand::Shutdown)));
    }

    #[test]
    fn test_request_times_out_without_worker() {
        let (_engine, handle) = Engine::new(test_config());
        let handle = handle.with_reply_timeout(Duration::from_millis(10));
        let err = handle.add_channel().unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }

    #[test]
    fn test_request_fails_after_worker_gone() {
        let (engine, handle) = Engine::new(test_config());
        drop(engine);
        let err = handle
            .update_thresholds("channel_0", ThresholdConfig::disabled())
            .unwrap_err();
        assert!(matches!(err, EngineError::Channel(_)));
    }

    #[test]
    fn test_zero_initial_channels() {
        let (_engine, handle) = Engine::new(EngineConfig::default().with_initial_channels(0));
        assert!(handle.snapshot().is_empty());
    }
}
