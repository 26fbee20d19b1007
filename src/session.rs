use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use uuid::Uuid;

/// One initialized client session. Owned by the store; the dispatcher only
/// borrows it by token lookup.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub created_at: SystemTime,
}

/// Process-wide token → session map. A token is valid iff it is present
/// here; tokens are never reused after termination.
///
/// `create` and `terminate` serialize against `is_valid` through the
/// mutex. No lock is held across an await: the dispatcher locks only for
/// the map operation itself.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// Mint a new session and return its token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            token: token.clone(),
            created_at: SystemTime::now(),
        };
        self.sessions
            .lock()
            .expect("session store poisoned")
            .insert(token.clone(), session);
        tracing::info!(token = %token, "session created");
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .contains_key(token)
    }

    /// Remove a session. Returns true iff it existed; terminating an
    /// unknown token is a no-op reported as false.
    pub fn terminate(&self, token: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .expect("session store poisoned")
            .remove(token)
            .is_some();
        if removed {
            tracing::info!(token = %token, "session terminated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
