use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use murmur_api::{ApiError, AppState, messages};
use murmur_types::events::SyncEvent;
use murmur_types::models::{Message, UserId};

/// Snapshots buffered before the loop waits on the receiver.
const EVENT_BUFFER: usize = 16;
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("poller is already running")]
    AlreadyStarted,

    #[error("poller has been stopped")]
    Stopped,
}

/// Keeps one open chat fresh by refetching it on a fixed interval.
///
/// Each tick marks the peer's messages to the viewer as read, then reloads
/// the whole conversation. The timer task lives exactly as long as this
/// value: `stop()` ends it and waits, dropping the poller cancels it.
pub struct ConversationPoller {
    state: AppState,
    viewer_id: UserId,
    peer_id: UserId,
    interval: Duration,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    status: PollerState,
}

impl ConversationPoller {
    pub fn new(state: AppState, viewer_id: UserId, peer_id: UserId, interval: Duration) -> Self {
        Self {
            state,
            viewer_id,
            peer_id,
            interval: interval.max(MIN_INTERVAL),
            cancel: CancellationToken::new(),
            task: None,
            status: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.status
    }

    pub fn peer_id(&self) -> UserId {
        self.peer_id
    }

    /// Spawn the timer task. The first snapshot arrives immediately.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<mpsc::Receiver<SyncEvent>, SyncError> {
        match self.status {
            PollerState::Polling => return Err(SyncError::AlreadyStarted),
            PollerState::Stopped => return Err(SyncError::Stopped),
            PollerState::Idle => {}
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.task = Some(tokio::spawn(run_poll_loop(
            self.state.clone(),
            self.viewer_id,
            self.peer_id,
            self.interval,
            tx,
            self.cancel.clone(),
        )));
        self.status = PollerState::Polling;

        info!(
            "Polling conversation {} <-> {} every {:?}",
            self.viewer_id, self.peer_id, self.interval
        );
        Ok(rx)
    }

    /// Cancel the timer and wait for the task to finish.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(
                    "Poller task for {} <-> {} ended abnormally: {}",
                    self.viewer_id, self.peer_id, e
                );
            }
        }
        self.status = PollerState::Stopped;
    }
}

impl Drop for ConversationPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_poll_loop(
    state: AppState,
    viewer_id: UserId,
    peer_id: UserId,
    period: Duration,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let event = match poll_once(&state, viewer_id, peer_id).await {
            Ok(messages) => SyncEvent::Conversation {
                viewer_id,
                peer_id,
                messages,
                fetched_at: chrono::Utc::now(),
            },
            Err(e) => {
                warn!("Poll of {} <-> {} failed: {}", viewer_id, peer_id, e);
                SyncEvent::FetchFailed {
                    viewer_id,
                    peer_id,
                    reason: e.to_string(),
                }
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(event) => {
                if sent.is_err() {
                    debug!("Receiver for {} <-> {} dropped", viewer_id, peer_id);
                    break;
                }
            }
        }
    }

    debug!("Poller for {} <-> {} stopped", viewer_id, peer_id);
}

async fn poll_once(
    state: &AppState,
    viewer_id: UserId,
    peer_id: UserId,
) -> Result<Vec<Message>, ApiError> {
    messages::mark_read(state, peer_id, viewer_id).await?;
    messages::get_conversation(state, viewer_id, peer_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_api::AppStateInner;
    use murmur_db::Database;

    const TICK: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(5);

    fn setup() -> (AppState, UserId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let viewer = db.create_user("viewer", "v@example.com", "hash", None).unwrap();
        let peer = db.create_user("peer", "p@example.com", "hash", None).unwrap();
        (AppStateInner::new(db), viewer, peer)
    }

    async fn next_snapshot(rx: &mut mpsc::Receiver<SyncEvent>) -> Vec<Message> {
        let event = tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("poller produced no event in time")
            .expect("poller channel closed");
        event.messages().expect("tick failed").to_vec()
    }

    async fn drain(rx: &mut mpsc::Receiver<SyncEvent>) {
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn first_tick_marks_read_and_fetches() {
        let (state, viewer, peer) = setup();
        state.db.insert_message(peer, viewer, "hello").unwrap();
        state.db.insert_message(viewer, peer, "hi back").unwrap();

        let mut poller = ConversationPoller::new(state.clone(), viewer, peer, TICK);
        assert_eq!(poller.state(), PollerState::Idle);
        assert_eq!(poller.peer_id(), peer);
        let mut rx = poller.start().unwrap();
        assert_eq!(poller.state(), PollerState::Polling);

        let messages = next_snapshot(&mut rx).await;
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_read);
        // the viewer's own message is only read once the peer opens the chat
        assert!(!messages[1].is_read);
        assert_eq!(state.db.unread_count(viewer).unwrap(), 0);

        poller.stop().await;
    }

    #[tokio::test]
    async fn later_ticks_pick_up_new_messages() {
        let (state, viewer, peer) = setup();
        let mut poller = ConversationPoller::new(state.clone(), viewer, peer, TICK);
        let mut rx = poller.start().unwrap();

        assert!(next_snapshot(&mut rx).await.is_empty());
        state.db.insert_message(peer, viewer, "ping").unwrap();

        let mut latest = Vec::new();
        for _ in 0..50 {
            latest = next_snapshot(&mut rx).await;
            if !latest.is_empty() {
                break;
            }
        }
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].body, "ping");

        poller.stop().await;
    }

    #[tokio::test]
    async fn stop_closes_channel_and_cannot_restart() {
        let (state, viewer, peer) = setup();
        let mut poller = ConversationPoller::new(state, viewer, peer, TICK);
        let mut rx = poller.start().unwrap();
        assert_eq!(poller.start().unwrap_err(), SyncError::AlreadyStarted);

        poller.stop().await;
        assert_eq!(poller.state(), PollerState::Stopped);

        let drained = tokio::time::timeout(WAIT, drain(&mut rx)).await;
        assert!(drained.is_ok(), "channel should close after stop");
        assert_eq!(poller.start().unwrap_err(), SyncError::Stopped);
    }

    #[tokio::test]
    async fn dropping_poller_cancels_task() {
        let (state, viewer, peer) = setup();
        let mut poller = ConversationPoller::new(state, viewer, peer, TICK);
        let mut rx = poller.start().unwrap();
        next_snapshot(&mut rx).await;

        drop(poller);

        let drained = tokio::time::timeout(WAIT, drain(&mut rx)).await;
        assert!(drained.is_ok(), "channel should close once the poller is dropped");
    }
}
