//! Continuous validation against one reference.
//!
//! A session is either idle or watching a single reference key. While
//! watching it holds an immutable snapshot of the reference pads taken at
//! [`ValidationSession::start`]. Each poll is split into
//! [`begin_tick`](ValidationSession::begin_tick), which hands out a
//! [`TickTicket`], and [`complete_tick`](ValidationSession::complete_tick),
//! which publishes the result only if the session has not been stopped or
//! restarted in between.

use std::sync::Arc;

use padcheck_core::RgbaImageView;
use padcheck_detect::{PadCandidate, PadDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::ValidationError;
use crate::reference::{ReferenceKey, ReferencePad};
use crate::scoring::{score_reference_match, ValidationParams, ValidationResult};
use crate::store::ReferenceStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Watching,
}

#[derive(Clone, Debug)]
struct ActiveReference {
    key: ReferenceKey,
    pads: Arc<[ReferencePad]>,
}

/// Permission to run one tick, carrying everything the tick needs so the
/// session can stay unlocked while detection runs.
#[derive(Clone, Debug)]
pub struct TickTicket {
    generation: u64,
    reference: Arc<[ReferencePad]>,
    params: ValidationParams,
}

impl TickTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reference(&self) -> &[ReferencePad] {
        &self.reference
    }

    /// Reference-match scoring of a detection against the session snapshot.
    pub fn score(&self, detected: &[PadCandidate]) -> ValidationResult {
        score_reference_match(&*self.reference, detected, &self.params)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationSession {
    params: ValidationParams,
    active: Option<ActiveReference>,
    generation: u64,
    in_flight: bool,
    last: Option<ValidationResult>,
}

impl ValidationSession {
    pub fn new(params: ValidationParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &ValidationParams {
        &self.params
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Watching
        } else {
            SessionState::Idle
        }
    }

    pub fn active_key(&self) -> Option<&ReferenceKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    /// Bumped on every start and stop; tickets from older generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last published verdict of the current watch.
    pub fn last_result(&self) -> Option<&ValidationResult> {
        self.last.as_ref()
    }

    /// Start watching `key`, replacing any previous watch.
    ///
    /// The session is left unchanged when the reference is missing or empty.
    pub fn start<S>(&mut self, store: &S, key: &ReferenceKey) -> Result<(), ValidationError>
    where
        S: ReferenceStore + ?Sized,
    {
        let record = store
            .get(key)
            .ok_or_else(|| ValidationError::NoReferenceFound(key.clone()))?;
        if record.pads.is_empty() {
            return Err(ValidationError::EmptyReferencePads);
        }

        self.generation += 1;
        self.in_flight = false;
        self.last = None;
        self.active = Some(ActiveReference {
            key: key.clone(),
            pads: record.pads.iter().cloned().collect(),
        });
        log::info!(
            "watching {key} ({} reference pads, generation {})",
            record.pads.len(),
            self.generation
        );
        Ok(())
    }

    /// Return to idle. Any tick still in flight will be discarded.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.generation += 1;
            self.in_flight = false;
            self.last = None;
            log::info!("stopped watching {}", active.key);
        }
    }

    /// Stop if `key` is the reference being watched. Returns whether it was.
    pub fn reference_deleted(&mut self, key: &ReferenceKey) -> bool {
        if self.active_key() == Some(key) {
            self.stop();
            true
        } else {
            false
        }
    }

    pub fn begin_tick(&mut self) -> Result<TickTicket, ValidationError> {
        let active = self.active.as_ref().ok_or(ValidationError::SessionIdle)?;
        if self.in_flight {
            return Err(ValidationError::TickInProgress);
        }
        self.in_flight = true;
        Ok(TickTicket {
            generation: self.generation,
            reference: Arc::clone(&active.pads),
            params: self.params.clone(),
        })
    }

    /// Finish a tick. `outcome` is `None` when the tick failed.
    ///
    /// Returns the newly published result, or `None` when nothing was
    /// published (failed tick, or a ticket from a stopped/restarted session).
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        outcome: Option<ValidationResult>,
    ) -> Option<&ValidationResult> {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding tick from generation {} (current {})",
                ticket.generation,
                self.generation
            );
            return None;
        }
        self.in_flight = false;
        let result = outcome?;
        self.last = Some(result);
        self.last.as_ref()
    }

    /// Run one synchronous tick on a frame.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn poll_once(
        &mut self,
        detector: &PadDetector,
        frame: &RgbaImageView<'_>,
    ) -> Result<ValidationResult, ValidationError> {
        let ticket = self.begin_tick()?;
        let detected = detector.detect(frame);
        let result = ticket.score(&detected);
        self.complete_tick(ticket, Some(result.clone()));
        Ok(result)
    }
}
