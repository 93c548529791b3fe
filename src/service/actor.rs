//! The single task that owns and mutates the published resolution state.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::{Command, CoordinateMode};
use crate::models::{Coordinate, DistrictStatus, ResolutionPhase, ResolutionResult};
use crate::pip::DistrictIndex;
use crate::sources::{FetchOutcome, SourceRegistry, StatusFetcher, StatusSource};

pub const WAITING_FOR_LOCATION: &str = "Waiting for location...";
pub const NO_DISTRICT_FOUND: &str = "No district found for location.";

/// A finished fetch, tagged with the cycle that issued it
pub(crate) struct Completion {
    pub sequence: u64,
    pub outcome: FetchOutcome,
}

pub(crate) struct ResolutionActor {
    index: Arc<DistrictIndex>,
    registry: Arc<SourceRegistry>,
    fetcher: Arc<StatusFetcher>,
    mode: CoordinateMode,
    live: Option<Coordinate>,
    manual: Option<Coordinate>,
    /// Last issued cycle
    sequence: u64,
    /// Sequence of the state currently published
    applied: u64,
    state: watch::Sender<ResolutionResult>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl ResolutionActor {
    pub fn new(
        index: Arc<DistrictIndex>,
        registry: Arc<SourceRegistry>,
        fetcher: Arc<StatusFetcher>,
        mode: CoordinateMode,
        state: watch::Sender<ResolutionResult>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            index,
            registry,
            fetcher,
            mode,
            live: None,
            manual: None,
            sequence: 0,
            applied: 0,
            state,
            completions,
        }
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        self.start_cycle();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = completions.recv() => {
                    self.apply_completion(completion);
                }
            }
        }

        debug!("Resolution service stopped after {} cycles", self.sequence);
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::UpdateLive(coordinate) => {
                self.live = Some(coordinate);
                if self.mode == CoordinateMode::Live {
                    self.start_cycle();
                }
            }
            Command::SetManual(coordinate) => {
                self.manual = coordinate;
                if self.mode == CoordinateMode::Manual {
                    self.start_cycle();
                }
            }
            Command::SetMode(mode) => {
                info!("Coordinate mode set to {:?}", mode);
                self.mode = mode;
                self.start_cycle();
            }
            Command::Refresh => {
                self.start_cycle();
            }
            Command::Barrier(reply) => {
                let _ = reply.send(self.sequence);
            }
        }
    }

    fn authoritative(&self) -> Option<Coordinate> {
        match self.mode {
            CoordinateMode::Live => self.live,
            CoordinateMode::Manual => self.manual,
        }
    }

    /// Resolve inline and dispatch the fetch, if any. Returns the dispatched
    /// sequence and source.
    pub fn start_cycle(&mut self) -> Option<(u64, StatusSource)> {
        self.sequence += 1;
        let sequence = self.sequence;
        let coordinate = self.authoritative();

        self.publish(ResolutionResult {
            sequence,
            phase: ResolutionPhase::Resolving,
            coordinate,
            district: None,
            contact: None,
            status: DistrictStatus::Pending,
            error: None,
            updated_at: Utc::now(),
        });

        let Some(point) = coordinate else {
            debug!("No location available to find district");
            self.settle_without_district(sequence, None, WAITING_FOR_LOCATION);
            return None;
        };

        let Some(resolution) = self.index.resolve(point) else {
            info!("No district found for location {}", point);
            self.settle_without_district(sequence, Some(point), NO_DISTRICT_FOUND);
            return None;
        };

        let district = resolution.district.to_string();
        let contact = resolution.contact.cloned();
        if contact.is_none() {
            debug!("No contact info for district {}", district);
        }

        let source = self.registry.source_for(&district).clone();
        info!(
            "Cycle {}: {} resolved to {} ({:?}), fetching {}",
            sequence, point, district, resolution.matched_by, source.label
        );

        self.publish(ResolutionResult {
            sequence,
            phase: ResolutionPhase::Fetching,
            coordinate: Some(point),
            district: Some(district),
            contact,
            status: DistrictStatus::Pending,
            error: None,
            updated_at: Utc::now(),
        });

        self.dispatch(sequence, source.clone());
        Some((sequence, source))
    }

    fn dispatch(&self, sequence: u64, source: StatusSource) {
        let fetcher = Arc::clone(&self.fetcher);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch(&source).await;
            // The actor may already be gone
            let _ = completions.send(Completion { sequence, outcome });
        });
    }

    fn settle_without_district(
        &mut self,
        sequence: u64,
        coordinate: Option<Coordinate>,
        message: &str,
    ) {
        self.publish(ResolutionResult {
            sequence,
            phase: ResolutionPhase::Settled,
            coordinate,
            district: None,
            contact: None,
            status: DistrictStatus::Unavailable,
            error: Some(message.to_string()),
            updated_at: Utc::now(),
        });
    }

    /// Apply a fetch result unless a newer cycle has been published since.
    /// Returns whether it was applied.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        if completion.sequence < self.applied {
            debug!(
                "Dropping stale result from cycle {} (current {})",
                completion.sequence, self.applied
            );
            return false;
        }

        self.applied = completion.sequence;
        self.state.send_modify(|state| {
            state.sequence = completion.sequence;
            state.phase = ResolutionPhase::Settled;
            state.status = completion.outcome.status;
            state.error = completion.outcome.error;
            state.updated_at = Utc::now();
        });
        true
    }

    fn publish(&mut self, result: ResolutionResult) {
        self.applied = result.sequence;
        self.state.send_replace(result);
    }
}
