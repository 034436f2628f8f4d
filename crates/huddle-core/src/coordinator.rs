//! Optimistic send with reconciliation or rollback.
//!
//! Each call to [`SendCoordinator::send`] walks one outgoing message through
//! `Sending -> Reconciled | RolledBack`:
//!
//! 1. Blank content returns [`SendOutcome::Skipped`] without touching anything.
//! 2. The session is snapshotted and a provisional user message is appended,
//!    so readers see it before the backend answers.
//! 3. On success the provisional message (matched by its own id) is swapped
//!    for the confirmed user message and the agent replies.
//! 4. On failure the snapshot is restored and the error is returned.

use crate::directory::AgentDirectory;
use crate::error::HuddleError;
use crate::typing::TypingIndicator;
use huddle_client::types::into_messages;
use huddle_client::{ChatBackend, SendMessageRequest, SendMessageResponse};
use huddle_session::{Message, MessageId, Revision, SessionCache};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle of one outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Sending,
    Reconciled,
    RolledBack,
}

impl fmt::Display for SendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendPhase::Sending => write!(f, "sending"),
            SendPhase::Reconciled => write!(f, "reconciled"),
            SendPhase::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// Result of a successful [`SendCoordinator::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Content was blank; nothing happened.
    Skipped,
    /// The cache now holds the confirmed exchange.
    Reconciled {
        user_message: Message,
        responses: Vec<Message>,
    },
    /// The backend accepted the message but the session was closed meanwhile.
    Discarded,
}

/// Drives sends for any number of sessions.
pub struct SendCoordinator {
    backend: Arc<dyn ChatBackend>,
    cache: Arc<SessionCache>,
    directory: Arc<AgentDirectory>,
    typing: Arc<TypingIndicator>,
    next_local_id: AtomicU64,
    in_flight: AtomicUsize,
}

impl SendCoordinator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        cache: Arc<SessionCache>,
        directory: Arc<AgentDirectory>,
        typing: Arc<TypingIndicator>,
    ) -> Self {
        Self {
            backend,
            cache,
            directory,
            typing,
            next_local_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Whether any send is awaiting the backend.
    pub fn is_sending(&self) -> bool {
        self.pending() > 0
    }

    /// Number of sends awaiting the backend.
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Send `content` to `session_id` with an optimistic local insert.
    ///
    /// Errors are returned after the cache has been rolled back; nothing is
    /// retried.
    pub async fn send(
        &self,
        session_id: &str,
        content: &str,
        mentions: Vec<String>,
    ) -> Result<SendOutcome, HuddleError> {
        let content = content.trim();
        if content.is_empty() {
            tracing::debug!(session = %session_id, "ignoring blank message");
            return Ok(SendOutcome::Skipped);
        }

        let snapshot = self.cache.snapshot(session_id);
        let local_id = self.next_local_id.fetch_add(1, Ordering::SeqCst);
        let provisional = MessageId::Provisional(local_id);

        self.typing.start(&mentions, &self.directory.cached());
        let at = self.cache.append(
            session_id,
            Message::provisional(local_id, content, mentions.clone()),
        );
        let mut pending = PendingSend::new(self, session_id, provisional, at);
        tracing::debug!(
            session = %session_id,
            id = %provisional,
            phase = %SendPhase::Sending,
            "send started"
        );

        let request = SendMessageRequest::new(session_id, content, mentions);
        let result = self.backend.send_message(request).await;
        pending.settle();

        match result.map_err(HuddleError::from).and_then(confirm) {
            Ok((user_message, responses)) => {
                let mut replacements = Vec::with_capacity(responses.len() + 1);
                replacements.push(user_message.clone());
                replacements.extend(responses.iter().cloned());

                if self
                    .cache
                    .reconcile(session_id, at, &provisional, replacements)
                    .is_none()
                {
                    tracing::debug!(session = %session_id, id = %provisional, "session closed; discarding reply");
                    return Ok(SendOutcome::Discarded);
                }
                tracing::debug!(
                    session = %session_id,
                    id = %provisional,
                    confirmed = %user_message.id,
                    replies = responses.len(),
                    phase = %SendPhase::Reconciled,
                    "send finished"
                );
                Ok(SendOutcome::Reconciled {
                    user_message,
                    responses,
                })
            }
            Err(err) => {
                match self.cache.rollback(session_id, at, &snapshot, &provisional) {
                    Ok(kind) => tracing::warn!(
                        session = %session_id,
                        id = %provisional,
                        error = %err,
                        rollback = ?kind,
                        phase = %SendPhase::RolledBack,
                        "send failed"
                    ),
                    Err(rollback_err) => tracing::warn!(
                        session = %session_id,
                        error = %rollback_err,
                        "rollback failed"
                    ),
                }
                Err(err)
            }
        }
    }
}

fn confirm(response: SendMessageResponse) -> Result<(Message, Vec<Message>), HuddleError> {
    let user_message = Message::try_from(response.user_message)?;
    let responses = into_messages(response.responses)?;
    Ok((user_message, responses))
}

/// In-flight bookkeeping for one send.
///
/// Dropping it clears the typing indicator. If the send future is dropped
/// before the backend answered, the provisional message is removed too.
struct PendingSend<'a> {
    coordinator: &'a SendCoordinator,
    session_id: &'a str,
    provisional: MessageId,
    at: Revision,
    settled: bool,
}

impl<'a> PendingSend<'a> {
    fn new(
        coordinator: &'a SendCoordinator,
        session_id: &'a str,
        provisional: MessageId,
        at: Revision,
    ) -> Self {
        coordinator.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            coordinator,
            session_id,
            provisional,
            at,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        self.coordinator.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.coordinator.typing.clear();
        if !self.settled {
            tracing::debug!(session = %self.session_id, id = %self.provisional, "send cancelled");
            self.coordinator.cache.reconcile(
                self.session_id,
                self.at,
                &self.provisional,
                Vec::new(),
            );
        }
    }
}
