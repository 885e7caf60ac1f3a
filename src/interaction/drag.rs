//! Open drag sessions, keyed by pointer.

use std::collections::HashMap;

use super::TrackGeometry;
use crate::param::Handle;

/// Host-assigned pointer identifier.
pub type PointerId = u64;

/// One pointer dragging one handle.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub key: String,
    pub handle: Handle,
    pub track: TrackGeometry,
}

/// Tracks drag sessions. A given `(key, handle)` pair can be held by at most
/// one pointer; sessions on different parameters are independent.
#[derive(Debug, Default)]
pub struct DragTracker {
    sessions: HashMap<PointerId, DragSession>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session. Fails when the pointer is already dragging or the
    /// handle is held by another pointer.
    pub fn begin(&mut self, pointer: PointerId, session: DragSession) -> bool {
        if self.sessions.contains_key(&pointer) {
            return false;
        }
        let (key, handle) = (&session.key, session.handle);
        let taken = self
            .sessions
            .values()
            .any(|open| open.key == *key && open.handle == handle);
        if taken {
            return false;
        }
        log::trace!(
            "pointer {pointer} grabbed {}.{}",
            session.key,
            session.handle.label()
        );
        self.sessions.insert(pointer, session);
        true
    }

    pub fn session(&self, pointer: PointerId) -> Option<&DragSession> {
        self.sessions.get(&pointer)
    }

    /// Close the pointer's session, returning it if one was open.
    pub fn end(&mut self, pointer: PointerId) -> Option<DragSession> {
        let session = self.sessions.remove(&pointer);
        if let Some(session) = &session {
            log::trace!(
                "pointer {pointer} released {}.{}",
                session.key,
                session.handle.label()
            );
        }
        session
    }

    /// Whether any handle of `key` is being dragged.
    pub fn holds_key(&self, key: &str) -> bool {
        self.sessions.values().any(|session| session.key == key)
    }

    /// Close every session.
    pub fn clear(&mut self) -> Vec<DragSession> {
        self.sessions.drain().map(|(_, session)| session).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
