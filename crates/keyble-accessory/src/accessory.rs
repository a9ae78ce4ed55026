//! Per-lock reconciliation engine.
//!
//! Each lock gets one engine task that owns its [`PositionStateStore`]. Host
//! writes, status notifications, and command completions are all consumed
//! by that task one at a time, so the store is never written concurrently.
//!
//! ```text
//! ┌──────────┐  set target   ┌──────────────┐  lock/unlock/open  ┌──────────┐
//! │  Host    │──────────────►│              │───────────────────►│          │
//! │ binding  │               │ Engine task  │   (spawned)        │   Lock   │
//! │          │◄──────────────│  (store)     │◄───────────────────│          │
//! └──────────┘ updates/reads └──────────────┘  status reports    └──────────┘
//! ```
//!
//! Commands run in background tasks; their completions come back into the
//! same loop. A notification may be handled before the completion of the
//! command that caused it, and the store's precedence rule keeps the
//! notification's result in that case.
//!
//! # Examples
//!
//! ```no_run
//! use keyble_accessory::{AccessoryInformation, LockAccessory};
//! use keyble_hardware::mock::MockLock;
//!
//! #[tokio::main]
//! async fn main() -> keyble_accessory::Result<()> {
//!     let information = AccessoryInformation {
//!         name: "Front Door".to_string(),
//!         manufacturer: "eqiva".to_string(),
//!         model: "eq3".to_string(),
//!         serial_number: "Default-Serial".to_string(),
//!     };
//!     let (lock, _handle) = MockLock::new();
//!
//!     let mut accessory = LockAccessory::new(information, lock).start();
//!     accessory.set_target_position(50).await?;
//!
//!     while let Some(update) = accessory.next_update().await {
//!         println!("{} = {}", update.characteristic(), update.value());
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use keyble_core::{Position, PositionState};
use keyble_hardware::{AnyLockDevice, LockDevice, StatusNotification};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::characteristic::{AccessoryInformation, CharacteristicUpdate, HostNotifier};
use crate::config::AccessoryConfig;
use crate::error::{AccessoryError, Result};
use crate::recovery;
use crate::state::PositionStateStore;
use crate::translator::{self, CommandOutcome};

/// Request from the host binding to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessoryEvent {
    /// Host wrote the target position.
    SetTarget(Position),

    /// Host asked for the lock to report its status.
    Refresh,
}

/// A lock accessory that has not been started yet.
#[derive(Debug)]
pub struct LockAccessory {
    information: AccessoryInformation,
    device: AnyLockDevice,
    config: AccessoryConfig,
    sync_on_start: bool,
}

impl LockAccessory {
    /// Create an accessory for `device`.
    pub fn new(information: AccessoryInformation, device: impl Into<AnyLockDevice>) -> Self {
        Self {
            information,
            device: device.into(),
            config: AccessoryConfig::default(),
            sync_on_start: true,
        }
    }

    /// Override channel capacities.
    pub fn with_config(mut self, config: AccessoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Request a status from the lock as soon as the engine starts.
    ///
    /// Enabled by default.
    pub fn sync_on_start(mut self, enabled: bool) -> Self {
        self.sync_on_start = enabled;
        self
    }

    /// Accessory information.
    pub fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    /// Spawn the engine task and return the host handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> AccessoryHandle {
        let name: Arc<str> = Arc::from(self.information.name.as_str());
        let (events_tx, events_rx) = mpsc::channel(self.config.event_capacity);
        let (notifier, updates_rx) =
            HostNotifier::channel(name.as_ref(), self.config.update_capacity);

        let store = PositionStateStore::new();
        let state_rx = store.subscribe();

        // Subscribe before spawning so nothing pushed from here on is missed.
        let statuses = self.device.subscribe();

        let mut engine = Engine {
            name,
            device: Arc::new(self.device),
            store,
            notifier,
            commands: JoinSet::new(),
            requests: JoinSet::new(),
        };
        if self.sync_on_start {
            engine.request_status();
        }

        info!("{}: accessory started", engine.name);
        let task = tokio::spawn(engine.run(events_rx, statuses));

        AccessoryHandle {
            information: self.information,
            events: events_tx,
            state: state_rx,
            updates: updates_rx,
            task,
        }
    }
}

/// State owned by the engine task.
struct Engine {
    name: Arc<str>,
    device: Arc<AnyLockDevice>,
    store: PositionStateStore,
    notifier: HostNotifier,

    /// In-flight lock/unlock/open commands.
    commands: JoinSet<CommandOutcome>,

    /// In-flight status requests.
    requests: JoinSet<()>,
}

impl Engine {
    async fn run(
        mut self,
        mut events: mpsc::Receiver<AccessoryEvent>,
        mut statuses: broadcast::Receiver<StatusNotification>,
    ) {
        let mut statuses_open = true;

        loop {
            tokio::select! {
                // Host writes, then device notifications, then completions.
                biased;

                event = events.recv() => match event {
                    Some(AccessoryEvent::SetTarget(requested)) => self.on_set_target(requested),
                    Some(AccessoryEvent::Refresh) => self.request_status(),
                    None => {
                        debug!("{}: host handle dropped", self.name);
                        break;
                    }
                },

                notification = statuses.recv(), if statuses_open => match notification {
                    Ok(notification) => self.on_status(&notification),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "{}: missed {} status notifications, requesting status",
                            self.name, skipped
                        );
                        self.request_status();
                    }
                    Err(RecvError::Closed) => {
                        warn!("{}: status channel closed", self.name);
                        statuses_open = false;
                    }
                },

                Some(joined) = self.commands.join_next(), if !self.commands.is_empty() => {
                    match joined {
                        Ok(outcome) => self.on_command_outcome(outcome),
                        Err(e) => error!("{}: command task ended abnormally: {}", self.name, e),
                    }
                }

                Some(joined) = self.requests.join_next(), if !self.requests.is_empty() => {
                    if let Err(e) = joined {
                        error!("{}: status request task ended abnormally: {}", self.name, e);
                    }
                }
            }
        }

        self.commands.shutdown().await;
        self.requests.shutdown().await;
        info!("{}: accessory stopped", self.name);
    }

    fn on_set_target(&mut self, requested: Position) {
        if let Some((pending, state)) = translator::plan(&self.name, &mut self.store, requested) {
            self.notifier.publish(&state);
            self.commands
                .spawn(translator::issue(Arc::clone(&self.device), pending));
        }
    }

    fn on_status(&mut self, notification: &StatusNotification) {
        let state = crate::reconciler::reconcile(&self.name, &mut self.store, notification);
        self.notifier.publish(&state);
    }

    fn on_command_outcome(&mut self, outcome: CommandOutcome) {
        let CommandOutcome { pending, result } = outcome;
        match result {
            Ok(()) => {
                if let Some(state) = translator::complete(&self.name, &mut self.store, &pending) {
                    self.notifier.publish(&state);
                }
            }
            Err(failure) => {
                self.requests.spawn(recovery::recover(
                    Arc::clone(&self.device),
                    Arc::clone(&self.name),
                    pending.command,
                    failure,
                ));
            }
        }
    }

    fn request_status(&mut self) {
        let device = Arc::clone(&self.device);
        let name = Arc::clone(&self.name);
        self.requests.spawn(async move {
            if let Err(e) = device.request_status().await {
                error!("{}: status request failed: {}", name, e);
            }
        });
    }
}

/// Host-side handle to a running accessory.
///
/// Reads are served from the latest published snapshot and never wait on
/// the lock. Writes are acknowledged once the engine has queued them.
#[derive(Debug)]
pub struct AccessoryHandle {
    information: AccessoryInformation,
    events: mpsc::Sender<AccessoryEvent>,
    state: watch::Receiver<PositionState>,
    updates: mpsc::Receiver<CharacteristicUpdate>,
    task: JoinHandle<()>,
}

impl AccessoryHandle {
    /// Accessory information.
    pub fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    /// Latest position triple.
    pub fn snapshot(&self) -> PositionState {
        *self.state.borrow()
    }

    /// Current position characteristic (0-50).
    pub fn current_position(&self) -> u8 {
        let value = self.snapshot().current_position.as_percent();
        debug!(
            "{}: get Current Position -> {}",
            self.information.name, value
        );
        value
    }

    /// Target position characteristic (0-100).
    pub fn target_position(&self) -> u8 {
        let value = self.snapshot().target_position.as_percent();
        debug!("{}: get Target Position -> {}", self.information.name, value);
        value
    }

    /// Position state characteristic (0 decreasing, 1 increasing, 2 stopped).
    pub fn position_state(&self) -> u8 {
        let value = self.snapshot().movement.to_characteristic();
        debug!("{}: get Position State -> {}", self.information.name, value);
        value
    }

    /// Write the target position characteristic.
    ///
    /// Returns once the write is queued; the lock's answer arrives later as
    /// characteristic updates.
    ///
    /// # Errors
    ///
    /// Returns `AccessoryError::Core` for values above 100 and
    /// `AccessoryError::EngineStopped` if the engine is gone.
    pub async fn set_target_position(&self, value: u8) -> Result<()> {
        let requested = Position::from_percent(value)?;
        debug!(
            "{}: set Target Position -> {} ({})",
            self.information.name, value, requested
        );
        self.send(AccessoryEvent::SetTarget(requested)).await
    }

    /// Ask the lock to report its status.
    ///
    /// # Errors
    ///
    /// Returns `AccessoryError::EngineStopped` if the engine is gone.
    pub async fn refresh(&self) -> Result<()> {
        self.send(AccessoryEvent::Refresh).await
    }

    /// Receive the next characteristic update pushed by the engine.
    ///
    /// Returns `None` once the engine has stopped and all updates are drained.
    pub async fn next_update(&mut self) -> Option<CharacteristicUpdate> {
        self.updates.recv().await
    }

    /// Receive a pending characteristic update without waiting.
    pub fn try_next_update(&mut self) -> Option<CharacteristicUpdate> {
        self.updates.try_recv().ok()
    }

    /// Wait until the position triple satisfies `predicate`.
    ///
    /// The current triple is checked first.
    ///
    /// # Errors
    ///
    /// Returns `AccessoryError::EngineStopped` if the engine stops first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&PositionState) -> bool,
    ) -> Result<PositionState> {
        match self.state.wait_for(predicate).await {
            Ok(state) => Ok(*state),
            Err(_) => Err(AccessoryError::engine_stopped(self.information.name.clone())),
        }
    }

    /// Subscribe to position triple changes.
    pub fn subscribe(&self) -> watch::Receiver<PositionState> {
        self.state.clone()
    }

    /// Stop the engine and wait for it to finish.
    ///
    /// In-flight commands are abandoned.
    ///
    /// # Errors
    ///
    /// Returns `AccessoryError::EngineStopped` if the engine task panicked.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            information,
            events,
            task,
            ..
        } = self;
        drop(events);

        task.await.map_err(|e| {
            error!("{}: engine task failed: {}", information.name, e);
            AccessoryError::engine_stopped(information.name.clone())
        })
    }

    async fn send(&self, event: AccessoryEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AccessoryError::engine_stopped(self.information.name.clone()))
    }
}
