use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use chrono::Utc;
use checkin_core::{LedgerError, LedgerStore, SessionToken};
use serde::Deserialize;
use tracing::{debug, info};

use super::{cookie, AppError, AppState};
use crate::page::{self, PageData};

#[derive(Deserialize)]
pub struct CheckInForm {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// The caller's session token, if it is currently valid.
fn authorized(state: &AppState, headers: &HeaderMap) -> Option<SessionToken> {
    cookie::session_token(headers).filter(|token| state.sessions.is_authorized(*token))
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<SessionToken, AppError> {
    authorized(state, headers).ok_or(AppError::Unauthorized)
}

/// Cooldown in whole hours from the submitted form field.
fn parse_cooldown(raw: Option<&str>) -> Result<i64, AppError> {
    raw.map(str::trim)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|hours| *hours >= 0)
        .ok_or(AppError::BadRequest("Invalid time"))
}

/// An oversized body keeps its 413; anything else is a malformed form.
fn form_error(rejection: FormRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    debug!(error = %rejection.body_text(), "Form rejected");
    AppError::BadRequest("Error parsing form")
}

/// Run a ledger operation off the async workers; it does blocking file I/O.
async fn with_ledger<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&LedgerStore) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = state.ledger.clone();
    Ok(tokio::task::spawn_blocking(move || op(&ledger)).await??)
}

/// GET /: history and check-in form, or the login form.
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    info!("GET request received");

    let page = match authorized(&state, &headers) {
        Some(_) => {
            let ledger = with_ledger(&state, |store| store.load()).await?;
            let username = state.sessions.credentials().username();
            PageData::dashboard(username, &ledger, Utc::now().timestamp())
        }
        None => PageData::login(),
    };

    Ok(Html(page::render(&page)))
}

/// POST /post: record a check-in if the cooldown has passed.
pub async fn check_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<CheckInForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    info!("POST request received");

    require_session(&state, &headers)?;
    let Form(form) = form.map_err(form_error)?;
    let hours = parse_cooldown(form.next.as_deref())?;

    let now = Utc::now().timestamp();
    let record = with_ledger(&state, move |store| store.try_check_in(now, hours)).await?;
    info!(
        cooldown_hours = hours,
        next_allowed_at = record.next_allowed_at,
        "Check-in recorded"
    );

    Ok(Redirect::to("/"))
}

/// POST /login: exchange the credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    info!("LOGIN request received");

    let Form(form) = form.map_err(form_error)?;
    let session = state.sessions.authenticate(&form.username, &form.password)?;

    Ok(([(header::SET_COOKIE, cookie::issue(&session))], Redirect::to("/")))
}

/// POST /logout: revoke the session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    info!("LOGOUT request received");

    let token = require_session(&state, &headers)?;
    state.sessions.revoke(token);

    Ok(([(header::SET_COOKIE, cookie::clear())], Redirect::to("/")))
}

// ============================================================================
// Tests
// ============================================================================
