//! Location resolution service.
//!
//! Turns the user's current coordinate into a district and that district's
//! burn status. All state lives in one task; callers talk to it through a
//! [`ResolutionHandle`] and observe results through a `watch` channel.
//!
//! Every cycle gets a sequence number. A fetch result is only applied while
//! no newer cycle has been published, so a slow response for an old location
//! never overwrites a newer one.

mod actor;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

use crate::models::{Coordinate, ResolutionPhase, ResolutionResult};
use crate::pip::DistrictIndex;
use crate::sources::{SourceRegistry, StatusFetcher};
use actor::ResolutionActor;

pub use actor::{NO_DISTRICT_FOUND, WAITING_FOR_LOCATION};

/// Which coordinate drives resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateMode {
    /// Device position updates
    #[default]
    Live,
    /// A user-entered location
    Manual,
}

#[derive(Debug)]
pub(crate) enum Command {
    UpdateLive(Coordinate),
    SetManual(Option<Coordinate>),
    SetMode(CoordinateMode),
    Refresh,
    /// Replies with the last issued cycle once every earlier command is handled
    Barrier(oneshot::Sender<u64>),
}

#[derive(Debug, Error)]
#[error("location resolution service has stopped")]
pub struct ServiceClosed;

/// Clonable handle to a running resolution service
#[derive(Clone)]
pub struct ResolutionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ResolutionResult>,
    index: Arc<DistrictIndex>,
}

impl ResolutionHandle {
    /// Start the service on the current runtime. An initial cycle runs
    /// straight away.
    pub fn spawn(
        index: Arc<DistrictIndex>,
        registry: Arc<SourceRegistry>,
        fetcher: Arc<StatusFetcher>,
        mode: CoordinateMode,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ResolutionResult::idle());

        info!(
            "Starting resolution service: {} districts, {} source overrides, {:?} mode",
            index.len(),
            registry.override_count(),
            mode
        );

        let actor = ResolutionActor::new(
            Arc::clone(&index),
            registry,
            fetcher,
            mode,
            state_tx,
            completion_tx,
        );
        tokio::spawn(actor.run(command_rx, completion_rx));

        Self {
            commands: command_tx,
            state: state_rx,
            index,
        }
    }

    /// New device position. Only starts a cycle in live mode.
    pub fn update_live(&self, coordinate: Coordinate) -> Result<(), ServiceClosed> {
        self.send(Command::UpdateLive(coordinate))
    }

    /// Set or clear the manual location. Only starts a cycle in manual mode.
    pub fn set_manual(&self, coordinate: Option<Coordinate>) -> Result<(), ServiceClosed> {
        self.send(Command::SetManual(coordinate))
    }

    pub fn set_mode(&self, mode: CoordinateMode) -> Result<(), ServiceClosed> {
        self.send(Command::SetMode(mode))
    }

    /// Re-resolve and re-fetch for the current coordinate
    pub fn refresh(&self) -> Result<(), ServiceClosed> {
        self.send(Command::Refresh)
    }

    fn send(&self, command: Command) -> Result<(), ServiceClosed> {
        self.commands.send(command).map_err(|_| ServiceClosed)
    }

    /// Snapshot of the latest published result
    pub fn current(&self) -> ResolutionResult {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolutionResult> {
        self.state.clone()
    }

    pub fn index(&self) -> &DistrictIndex {
        &self.index
    }

    /// Wait until the cycle started by the most recent command from this
    /// handle, or a later one, has settled
    pub async fn wait_for_settled(&self) -> Result<ResolutionResult, ServiceClosed> {
        let (reply, issued) = oneshot::channel();
        self.send(Command::Barrier(reply))?;
        let sequence = issued.await.map_err(|_| ServiceClosed)?;

        let mut state = self.state.clone();
        let settled = state
            .wait_for(|result| {
                result.sequence >= sequence && result.phase == ResolutionPhase::Settled
            })
            .await
            .map_err(|_| ServiceClosed)?;
        Ok(settled.clone())
    }
}
