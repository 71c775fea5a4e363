//! Live event loop.
//!
//! One task owns the engine. It applies queued mutations, starts a save
//! when the debounce deadline passes, waits on the in-flight write, and
//! polls the backing document on a fixed interval. Poll failures are
//! logged and swallowed so they never interrupt editing.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::backend::BoardBackend;
use super::engine::{PendingSave, SyncEngine};
use super::types::{PollOutcome, SaveReport, SyncError, SyncResult, WriteReceipt};
use crate::error::{Error, Result};

/// A mutation or query run against the engine inside the loop.
pub type Job<B> = Box<dyn FnOnce(&mut SyncEngine<B>) -> Result<String> + Send>;

/// Input to the live loop.
pub enum LiveEvent<B: BoardBackend> {
    /// Run a job; its output or error is reported.
    Apply(Job<B>),
    /// Pause or resume polling.
    Visible(bool),
    /// Save now.
    Flush,
    /// Save and stop.
    Quit,
}

/// Something the loop wants the user to see.
#[derive(Debug)]
pub enum LiveNotice {
    Output(String),
    Failed(Error),
    Saved(SaveReport),
    Reloaded { discarded_local: bool },
}

type InFlight = (PendingSave, JoinHandle<SyncResult<WriteReceipt>>);

fn spawn_write<B: BoardBackend>(engine: &mut SyncEngine<B>) -> Result<Option<InFlight>> {
    let Some(pending) = engine.begin_save()? else {
        return Ok(None);
    };
    let backend = engine.backend().clone();
    let content = pending.content.clone();
    let handle = tokio::spawn(async move { backend.write(content).await });
    Ok(Some((pending, handle)))
}

async fn join_write(in_flight: &mut Option<InFlight>) -> SyncResult<WriteReceipt> {
    match in_flight.as_mut() {
        Some((_, handle)) => handle
            .await
            .map_err(|e| SyncError::WriteFailed(e.to_string()))?,
        None => std::future::pending().await,
    }
}

/// Run until `events` closes or sends [`LiveEvent::Quit`], then flush.
///
/// # Errors
///
/// Returns an error only if the final flush fails.
pub async fn run_live<B: BoardBackend>(
    engine: &mut SyncEngine<B>,
    mut events: mpsc::Receiver<LiveEvent<B>>,
    mut notify: impl FnMut(LiveNotice),
) -> Result<()> {
    let poll_every = engine.settings().poll.max(Duration::from_millis(50));
    let mut poll = time::interval_at(Instant::now() + poll_every, poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<InFlight> = None;

    loop {
        if in_flight.is_none() && engine.save_due(Instant::now()) {
            match spawn_write(engine) {
                Ok(started) => in_flight = started,
                Err(e) => notify(LiveNotice::Failed(e)),
            }
        }

        let deadline = if in_flight.is_none() {
            engine.next_deadline()
        } else {
            None
        };
        let sleep_until = deadline.unwrap_or_else(|| Instant::now() + poll_every);

        tokio::select! {
            event = events.recv() => match event {
                None | Some(LiveEvent::Quit) => break,
                Some(LiveEvent::Apply(job)) => match job(engine) {
                    Ok(out) if out.is_empty() => {}
                    Ok(out) => notify(LiveNotice::Output(out)),
                    Err(e) => notify(LiveNotice::Failed(e)),
                },
                Some(LiveEvent::Visible(visible)) => engine.set_visible(visible),
                Some(LiveEvent::Flush) => engine.request_save(true),
            },

            () = time::sleep_until(sleep_until), if deadline.is_some() => {
                debug!("Save deadline reached");
            }

            result = join_write(&mut in_flight), if in_flight.is_some() => {
                if let Some((pending, _)) = in_flight.take() {
                    match engine.complete_save(pending, result) {
                        Ok(report) => notify(LiveNotice::Saved(report)),
                        Err(e) => notify(LiveNotice::Failed(e)),
                    }
                }
            }

            _ = poll.tick() => match engine.poll_once().await {
                Ok(PollOutcome::Replaced { discarded_local }) => {
                    notify(LiveNotice::Reloaded { discarded_local });
                }
                Ok(outcome) => debug!(?outcome, "Poll"),
                Err(e) => warn!(error = %e, "Poll failed"),
            },
        }
    }

    if let Some((pending, handle)) = in_flight.take() {
        let result = handle
            .await
            .unwrap_or_else(|e| Err(SyncError::WriteFailed(e.to_string())));
        if let Err(e) = engine.complete_save(pending, result) {
            notify(LiveNotice::Failed(e));
        }
    }
    if let Some(report) = engine.flush().await? {
        notify(LiveNotice::Saved(report));
    }
    Ok(())
}
