//! Engine worker thread
//!
//! This module contains the main loop that owns the channel registry. It
//! communicates with the UI thread through crossbeam channels and publishes
//! an immutable snapshot after every change.
//!
//! # Responsibilities
//!
//! - **Command processing**: Add, remove, and edit channels between ticks
//! - **Ticking**: Samples every channel once per tick interval
//! - **Breach tracking**: Reports limit status changes per channel
//! - **Statistics**: Tick timing and effective tick rate
//!
//! # Scheduling
//!
//! Ticks run on the worker thread only, so they never overlap. Deadlines
//! advance by one interval per tick; a tick that overruns its slot makes the
//! next tick fire immediately, without queueing the slots that were missed.
//! While waiting for a deadline the worker blocks on the command channel, so
//! commands are applied between ticks without delay.

use super::factory::ChannelFactory;
use super::generator::RandomSource;
use super::registry::ChannelRegistry;
use super::snapshot::SnapshotCell;
use super::{Engine, EngineCommand, EngineMessage, Reply};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::types::{now_ms, Channel, EngineState, EngineStats, LimitStatus, ThresholdConfig};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Worker that owns the registry and drives the tick cycle
pub struct EngineWorker {
    config: EngineConfig,
    command_rx: Receiver<EngineCommand>,
    message_tx: Sender<EngineMessage>,
    running: Arc<AtomicBool>,
    registry: ChannelRegistry,
    factory: ChannelFactory,
    rng: Box<dyn RandomSource>,
    snapshot: Arc<SnapshotCell>,
    generation: u64,
    state: EngineState,
    tick_interval: Duration,
    next_tick: Instant,
    stats: EngineStats,
    last_stats_time: Instant,
    ticks_at_last_stats: u64,
    /// Last reported limit status per channel
    breach_state: HashMap<String, LimitStatus>,
}

impl EngineWorker {
    /// Create a worker from an engine's initial state
    pub fn new(engine: Engine) -> Self {
        let Engine {
            config,
            registry,
            rng,
            command_receiver,
            message_sender,
            running,
            snapshot,
        } = engine;

        let factory = ChannelFactory::new(config.generator, config.backfill);
        let tick_interval = config.tick.interval();
        let breach_state = registry.statuses().into_iter().collect();
        let stats = EngineStats {
            channel_count: registry.len(),
            ..Default::default()
        };
        let now = Instant::now();

        Self {
            config,
            command_rx: command_receiver,
            message_tx: message_sender,
            running,
            registry,
            factory,
            rng,
            snapshot,
            generation: 0,
            state: EngineState::Running,
            tick_interval,
            next_tick: now + tick_interval,
            stats,
            last_stats_time: now,
            ticks_at_last_stats: 0,
            breach_state,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!(
            "Engine worker started ({} channels, {:?} tick)",
            self.registry.len(),
            self.tick_interval
        );

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();

            if self.state == EngineState::Running && Instant::now() >= self.next_tick {
                self.tick_at(now_ms());
                self.schedule_next_tick();
            }

            if self.last_stats_time.elapsed() >= self.config.tick.stats_interval() {
                self.send_stats();
            }

            self.wait_for_next_tick();
        }

        self.state = EngineState::Stopped;
        let _ = self.message_tx.send(EngineMessage::Shutdown);
        tracing::info!("Engine worker stopped after {} ticks", self.stats.ticks);
    }

    /// Process pending commands from the UI
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Block until the next deadline, waking early for commands
    fn wait_for_next_tick(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        let timeout = match self.state {
            EngineState::Running => self.next_tick.saturating_duration_since(Instant::now()),
            _ => self.tick_interval,
        };
        if timeout.is_zero() {
            return;
        }

        match self.command_rx.recv_timeout(timeout) {
            Ok(cmd) => self.handle_command(cmd),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::AddChannel { reply } => {
                if self.claim(&reply, "add channel") {
                    let result = self.add_channel();
                    self.reply(reply, result);
                }
            }
            EngineCommand::InsertChannel { channel, reply } => {
                if self.claim(&reply, "insert channel") {
                    let result = self.insert_channel(*channel);
                    self.reply(reply, result);
                }
            }
            EngineCommand::RemoveChannels(ids) => self.remove_channels(ids),
            EngineCommand::UpdateThresholds {
                id,
                thresholds,
                reply,
            } => {
                if self.claim(&reply, "update thresholds") {
                    let result = self.update_thresholds(&id, thresholds);
                    self.reply(reply, result);
                }
            }
            EngineCommand::SetTickInterval(interval_ms) => {
                self.tick_interval = Duration::from_millis(interval_ms.max(1));
                self.next_tick = Instant::now() + self.tick_interval;
                tracing::info!("Tick interval set to {:?}", self.tick_interval);
            }
            EngineCommand::Pause => {
                if self.state == EngineState::Running {
                    self.state = EngineState::Paused;
                    tracing::info!("Engine paused");
                }
            }
            EngineCommand::Resume => {
                if self.state == EngineState::Paused {
                    self.state = EngineState::Running;
                    self.next_tick = Instant::now();
                    tracing::info!("Engine resumed");
                }
            }
            EngineCommand::RequestStats => self.send_stats(),
            EngineCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    fn add_channel(&mut self) -> Result<String> {
        let index = self.registry.next_index();
        // Keep backfilled history from ending after the last tick
        let now = self.registry.last_tick().map_or(now_ms(), |last| now_ms().max(last));
        let channel = self.factory.create(index, now, self.rng.as_mut());
        let id = channel.id.clone();
        self.insert_channel(channel)?;
        Ok(id)
    }

    fn insert_channel(&mut self, channel: Channel) -> Result<()> {
        let id = channel.id.clone();
        self.registry.add(channel)?;
        tracing::info!("Added channel {}", id);

        self.publish();
        self.try_send_message(EngineMessage::ChannelAdded { id });
        self.detect_breaches();
        Ok(())
    }

    fn remove_channels(&mut self, ids: Vec<String>) {
        let removed = self.registry.remove(&ids);
        if removed.is_empty() {
            tracing::debug!("No channels removed for {:?}", ids);
            return;
        }

        for id in &removed {
            self.breach_state.remove(id);
        }
        tracing::info!("Removed channels {:?}", removed);
        self.publish();
        self.try_send_message(EngineMessage::ChannelsRemoved(removed));
    }

    fn update_thresholds(&mut self, id: &str, thresholds: ThresholdConfig) -> Result<()> {
        self.registry.update_thresholds(id, thresholds)?;
        tracing::info!("Updated thresholds for {}", id);

        self.publish();
        self.try_send_message(EngineMessage::ThresholdsUpdated { id: id.to_string() });
        self.detect_breaches();
        Ok(())
    }

    /// Take a waited-on command; expired or cancelled ones are rejected untouched
    fn claim<T>(&mut self, reply: &Option<Reply<T>>, action: &str) -> bool {
        let Some(reply) = reply else {
            return true;
        };
        if reply.claim() {
            return true;
        }

        self.stats.rejected_commands += 1;
        tracing::warn!("Dropping expired {} request", action);
        reply.send(Err(EngineError::Timeout(format!(
            "{} request expired before the worker reached it",
            action
        ))));
        false
    }

    /// Deliver a command outcome; rejections are counted and logged
    fn reply<T>(&mut self, reply: Option<Reply<T>>, result: Result<T>) {
        if let Err(e) = &result {
            self.stats.rejected_commands += 1;
            tracing::warn!("Command rejected: {}", e);
        }
        if let Some(reply) = reply {
            reply.send(result);
        }
    }

    /// Run one tick at wall-clock time `now`
    pub(crate) fn tick_at(&mut self, now: i64) {
        let started = Instant::now();
        self.registry.tick(now, self.rng.as_mut());
        self.stats
            .record_tick(started.elapsed().as_micros().min(u64::MAX as u128) as u64);

        self.publish();
        self.detect_breaches();
    }

    fn schedule_next_tick(&mut self) {
        self.next_tick += self.tick_interval;
        let now = Instant::now();
        if self.next_tick < now {
            self.next_tick = now;
        }
    }

    /// Swap a fresh snapshot into the shared cell
    fn publish(&mut self) {
        self.generation += 1;
        self.stats.channel_count = self.registry.len();
        self.snapshot.publish(self.registry.snapshot(self.generation));
    }

    /// Report channels whose limit status changed since the last report
    fn detect_breaches(&mut self) {
        for (id, status) in self.registry.statuses() {
            let previous = self
                .breach_state
                .insert(id.clone(), status)
                .unwrap_or_default();
            if previous == status {
                continue;
            }

            if status.is_breach() {
                tracing::warn!("{} breached {} limit", id, status);
            } else {
                tracing::info!("{} back within limits", id);
            }
            self.try_send_message(EngineMessage::BreachChanged { id, status });
        }
    }

    /// Send statistics to UI (using try_send for backpressure)
    fn send_stats(&mut self) {
        let elapsed = self.last_stats_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.stats.effective_tick_rate =
                (self.stats.ticks - self.ticks_at_last_stats) as f64 / elapsed;
        }
        self.ticks_at_last_stats = self.stats.ticks;
        self.last_stats_time = Instant::now();

        let stats = self.stats.clone();
        self.try_send_message(EngineMessage::Stats(stats));
    }

    /// Try to send a message, tracking dropped messages if queue is full
    fn try_send_message(&mut self, msg: EngineMessage) {
        if self.message_tx.try_send(msg).is_err() {
            self.stats.dropped_messages += 1;
        }
    }
}
