//! Session cookie handling.

use axum::http::{header, HeaderMap};
use checkin_core::{Session, SessionToken, SESSION_TTL_HOURS};
use tracing::debug;

use crate::utils::format_http_date;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Pull the session token out of the request's `Cookie` headers.
/// A present but unparsable value counts as no session.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)?;

    match value.parse() {
        Ok(token) => Some(token),
        Err(e) => {
            debug!(error = %e, "Ignoring session cookie");
            None
        }
    }
}

/// `Set-Cookie` value handing `session` to the client
pub fn issue(session: &Session) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}; Expires={}",
        SESSION_COOKIE,
        session.token,
        SESSION_TTL_HOURS * 60 * 60,
        format_http_date(session.advisory_expiry()),
    )
}

/// `Set-Cookie` value telling the client to drop its session
pub fn clear() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        SESSION_COOKIE
    )
}
