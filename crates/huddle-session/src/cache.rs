//! In-memory message cache keyed by session id.
//!
//! Each session holds an ordered message sequence behind a shared `Arc`, so
//! readers always clone a complete sequence and snapshots are cheap. All
//! mutations of all sessions go through one write lock, which serializes them.

use crate::error::SessionError;
use crate::message::{Message, MessageId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Position of a session entry in its mutation history.
///
/// `epoch` identifies one lifetime of the entry: it is assigned when the entry
/// is created and changes if the session is closed and written again.
/// `version` increments on every mutation within an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision {
    pub epoch: u64,
    pub version: u64,
}

/// Point-in-time copy of one session's message sequence.
#[derive(Debug, Clone)]
pub struct Snapshot {
    session_id: String,
    version: u64,
    messages: Arc<Vec<Message>>,
}

impl Snapshot {
    /// Session the snapshot was taken from.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Captured messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// What a fenced rollback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// Nothing else touched the session; the snapshot was restored exactly.
    Restored,
    /// Other mutations landed in between; only the provisional entry was removed.
    Pruned,
}

#[derive(Debug)]
struct Entry {
    epoch: u64,
    version: u64,
    messages: Arc<Vec<Message>>,
}

impl Entry {
    fn revision(&self) -> Revision {
        Revision {
            epoch: self.epoch,
            version: self.version,
        }
    }

    /// Mutate the sequence (copy-on-write when a snapshot shares it).
    fn update(&mut self, f: impl FnOnce(&mut Vec<Message>)) -> Revision {
        f(Arc::make_mut(&mut self.messages));
        self.version += 1;
        self.revision()
    }

    /// Remove `id`, then append the replacements not already present.
    fn remove_id(&mut self, id: &MessageId, replacements: Vec<Message>) -> Revision {
        self.update(|messages| {
            messages.retain(|m| m.id != *id);
            for message in replacements {
                if !messages.iter().any(|m| m.id == message.id) {
                    messages.push(message);
                }
            }
        })
    }
}

/// Message sequences for any number of sessions.
#[derive(Debug)]
pub struct SessionCache {
    sessions: RwLock<HashMap<String, Entry>>,
    next_epoch: AtomicU64,
}

impl SessionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_epoch: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry<'a>(
        &self,
        sessions: &'a mut HashMap<String, Entry>,
        session_id: &str,
    ) -> &'a mut Entry {
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Entry {
                epoch: self.next_epoch.fetch_add(1, Ordering::Relaxed),
                version: 0,
                messages: Arc::new(Vec::new()),
            })
    }

    /// Messages of a session in arrival order. Unknown sessions are empty.
    pub fn get(&self, session_id: &str) -> Vec<Message> {
        self.read()
            .get(session_id)
            .map(|entry| entry.messages.as_ref().clone())
            .unwrap_or_default()
    }

    /// Number of messages in a session.
    pub fn len(&self, session_id: &str) -> usize {
        self.read()
            .get(session_id)
            .map_or(0, |entry| entry.messages.len())
    }

    /// Whether a session holds no messages.
    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Current revision of a session, if it has an entry.
    pub fn revision(&self, session_id: &str) -> Option<Revision> {
        self.read().get(session_id).map(Entry::revision)
    }

    /// Ids of all sessions with an entry, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Append a message at the end of a session.
    pub fn append(&self, session_id: &str, message: Message) -> Revision {
        let mut sessions = self.write();
        self.entry(&mut sessions, session_id)
            .update(|messages| messages.push(message))
    }

    /// Remove every message matching `predicate`, then append `replacements`.
    ///
    /// Untouched messages keep their relative order.
    pub fn replace<F>(&self, session_id: &str, predicate: F, replacements: Vec<Message>) -> Revision
    where
        F: Fn(&Message) -> bool,
    {
        let mut sessions = self.write();
        self.entry(&mut sessions, session_id).update(|messages| {
            messages.retain(|m| !predicate(m));
            messages.extend(replacements);
        })
    }

    /// Replace the confirmed history of a session.
    ///
    /// Provisional messages of sends still in flight are kept after the new
    /// history so their completions can still find them.
    pub fn seed(&self, session_id: &str, messages: Vec<Message>) -> Revision {
        let mut sessions = self.write();
        self.entry(&mut sessions, session_id).update(|current| {
            let mut seeded = messages;
            seeded.extend(current.drain(..).filter(Message::is_provisional));
            *current = seeded;
        })
    }

    /// Capture the current sequence of a session.
    pub fn snapshot(&self, session_id: &str) -> Snapshot {
        let sessions = self.read();
        match sessions.get(session_id) {
            Some(entry) => Snapshot {
                session_id: session_id.to_string(),
                version: entry.version,
                messages: Arc::clone(&entry.messages),
            },
            None => Snapshot {
                session_id: session_id.to_string(),
                version: 0,
                messages: Arc::new(Vec::new()),
            },
        }
    }

    /// Revert a session to a previously captured sequence.
    pub fn restore(&self, session_id: &str, snapshot: &Snapshot) -> Result<Revision, SessionError> {
        check_snapshot(session_id, snapshot)?;
        let mut sessions = self.write();
        let entry = self.entry(&mut sessions, session_id);
        entry.messages = Arc::clone(&snapshot.messages);
        entry.version += 1;
        tracing::debug!(session = %session_id, len = entry.messages.len(), "restored snapshot");
        Ok(entry.revision())
    }

    /// Swap a provisional message for its confirmed replacements.
    ///
    /// Replacements whose id is already cached (a reseed picked them up
    /// first) are skipped.
    ///
    /// `at` is the revision returned when the provisional message was
    /// appended. Returns `None` without touching anything if the session was
    /// closed since then.
    pub fn reconcile(
        &self,
        session_id: &str,
        at: Revision,
        provisional: &MessageId,
        replacements: Vec<Message>,
    ) -> Option<Revision> {
        let mut sessions = self.write();
        let entry = sessions.get_mut(session_id)?;
        if entry.epoch != at.epoch {
            return None;
        }
        Some(entry.remove_id(provisional, replacements))
    }

    /// Undo a provisional append after a failed send.
    ///
    /// Restores `snapshot` exactly when no other mutation happened between the
    /// snapshot and the provisional append at `at`, and none since. Otherwise
    /// removes only the provisional message so concurrent work survives.
    /// Returns `Ok(None)` if the session was closed since `at`.
    pub fn rollback(
        &self,
        session_id: &str,
        at: Revision,
        snapshot: &Snapshot,
        provisional: &MessageId,
    ) -> Result<Option<Rollback>, SessionError> {
        check_snapshot(session_id, snapshot)?;
        let mut sessions = self.write();
        let Some(entry) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        if entry.epoch != at.epoch {
            return Ok(None);
        }

        if entry.version == at.version && snapshot.version + 1 == at.version {
            entry.messages = Arc::clone(&snapshot.messages);
            entry.version += 1;
            Ok(Some(Rollback::Restored))
        } else {
            entry.remove_id(provisional, Vec::new());
            Ok(Some(Rollback::Pruned))
        }
    }

    /// Drop a session's entry. Returns whether it existed.
    pub fn close(&self, session_id: &str) -> bool {
        let removed = self.write().remove(session_id).is_some();
        if removed {
            tracing::debug!(session = %session_id, "closed session cache");
        }
        removed
    }

    /// Drop every session.
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

fn check_snapshot(session_id: &str, snapshot: &Snapshot) -> Result<(), SessionError> {
    if snapshot.session_id != session_id {
        return Err(SessionError::SnapshotMismatch {
            expected: session_id.to_string(),
            found: snapshot.session_id.clone(),
        });
    }
    Ok(())
}
