use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::{rngs::OsRng, Rng};
use tracing::{debug, info, warn};

use super::{AuthError, Credentials};

/// How long clients are told to keep a session, in hours.
/// The authority itself never expires tokens; this only feeds the cookie.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Opaque bearer token: 63 random bits, always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(i64);

impl SessionToken {
    fn generate() -> Self {
        Self(OsRng.gen_range(0..i64::MAX))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionToken {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(value) if value >= 0 => Ok(Self(value)),
            _ => Err(AuthError::MalformedToken(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    fn new(token: SessionToken) -> Self {
        Self {
            token,
            issued_at: Utc::now(),
        }
    }

    /// When the client should drop this session
    pub fn advisory_expiry(&self) -> DateTime<Utc> {
        self.issued_at + Duration::hours(SESSION_TTL_HOURS)
    }
}

/// Issues and tracks session tokens for the configured credentials.
pub struct SessionAuthority {
    credentials: Credentials,
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl SessionAuthority {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Check the pair and, if it matches, register a fresh token.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if !self.credentials.matches(username, password) {
            warn!("Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        let mut sessions = self.sessions.write();
        let token = loop {
            let candidate = SessionToken::generate();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = Session::new(token);
        sessions.insert(token, session.clone());

        info!(active = sessions.len(), "Session issued");
        Ok(session)
    }

    pub fn is_authorized(&self, token: SessionToken) -> bool {
        self.sessions.read().contains_key(&token)
    }

    pub fn session(&self, token: SessionToken) -> Option<Session> {
        self.sessions.read().get(&token).cloned()
    }

    /// Invalidate a token. Returns whether it was live.
    pub fn revoke(&self, token: SessionToken) -> bool {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(&token).is_some();
        debug!(removed, active = sessions.len(), "Session revoked");
        removed
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }
}

// ============================================================================
// Tests
// ============================================================================
