//! Fixed-period polling of a frame source on a dedicated thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use padcheck_core::RgbaImage;
use padcheck_detect::PadDetector;

use crate::error::ValidationError;
use crate::scoring::ValidationResult;
use crate::session::{SessionState, ValidationSession};

/// Where the watcher gets its frames from (camera, directory, test fixture).
pub trait FrameSource: Send {
    type Error: std::error::Error + Send + 'static;

    fn next_frame(&mut self) -> Result<RgbaImage, Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    pub period: Duration,
    /// Stop on its own after this many ticks (failed ticks included).
    pub max_ticks: Option<usize>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(2000),
            max_ticks: None,
        }
    }
}

/// Counters returned when the watch thread ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub ticks: usize,
    pub published: usize,
    pub failed: usize,
    /// Results computed for a session that had since been stopped or restarted.
    pub discarded: usize,
    /// Ticks skipped: deadlines passed while an earlier tick overran, and
    /// ticks refused because another tick on the session was in flight.
    pub dropped: usize,
}

/// Handle to a running watch thread.
pub struct Watcher {
    session: Arc<Mutex<ValidationSession>>,
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<WatchSummary>,
}

fn lock(session: &Mutex<ValidationSession>) -> MutexGuard<'_, ValidationSession> {
    // A panicking callback must not wedge the session for other users.
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Advance `next_tick` by one period. When that deadline has already passed,
/// the next tick runs at once and every later deadline it ran past is
/// skipped; returns how many were skipped.
fn reschedule(next_tick: &mut Instant, period: Duration) -> usize {
    *next_tick += period;
    let now = Instant::now();
    if *next_tick >= now {
        return 0;
    }
    let behind = now.duration_since(*next_tick);
    *next_tick = now;
    if period.is_zero() {
        0
    } else {
        (behind.as_nanos() / period.as_nanos()) as usize
    }
}

impl Watcher {
    /// Spawn the poll loop. The first tick runs immediately.
    ///
    /// `on_result` is called on the watch thread for every published result.
    pub fn spawn<S, F>(
        session: Arc<Mutex<ValidationSession>>,
        detector: PadDetector,
        mut source: S,
        options: WatchOptions,
        mut on_result: F,
    ) -> Self
    where
        S: FrameSource + 'static,
        F: FnMut(&ValidationResult) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&session);

        let handle = thread::spawn(move || {
            let mut summary = WatchSummary::default();
            let period = options.period;
            let mut next_tick = Instant::now();

            loop {
                if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
                    break;
                }
                let wait = next_tick.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let ticket = match lock(&shared).begin_tick() {
                    Ok(ticket) => ticket,
                    Err(ValidationError::TickInProgress) => {
                        log::debug!("another tick is in flight, skipping this one");
                        summary.dropped += 1;
                        summary.dropped += reschedule(&mut next_tick, period);
                        continue;
                    }
                    Err(err) => {
                        log::info!("watch loop ending: {err}");
                        break;
                    }
                };
                summary.ticks += 1;

                let outcome = match source.next_frame() {
                    Ok(frame) => {
                        let detected = detector.detect(&frame.view());
                        Some(ticket.score(&detected))
                    }
                    Err(err) => {
                        log::warn!("tick {} failed: {err}", summary.ticks);
                        summary.failed += 1;
                        None
                    }
                };
                let failed = outcome.is_none();

                let published = {
                    let mut guard = lock(&shared);
                    let stale = ticket.generation() != guard.generation();
                    let published = guard.complete_tick(ticket, outcome).cloned();
                    if stale && !failed {
                        summary.discarded += 1;
                    }
                    published
                };
                if let Some(result) = published {
                    summary.published += 1;
                    log::debug!(
                        "tick {}: {} ({}/{})",
                        summary.ticks,
                        result.status,
                        result.matched_count,
                        result.total_count
                    );
                    on_result(&result);
                }

                let missed = reschedule(&mut next_tick, period);
                if missed > 0 {
                    log::warn!("tick overran the {period:?} period, dropping {missed} tick(s)");
                }
                summary.dropped += missed;
            }
            summary
        });

        Self {
            session,
            stop_tx,
            handle,
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.session).state()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the session and the thread. A tick in flight finishes but its
    /// result is not published.
    pub fn stop(self) -> WatchSummary {
        lock(&self.session).stop();
        // The thread may already have exited on its own.
        let _ = self.stop_tx.send(());
        self.join()
    }

    /// Wait for the thread to end on its own (`max_ticks` reached or session idle).
    pub fn join(self) -> WatchSummary {
        match self.handle.join() {
            Ok(summary) => summary,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
