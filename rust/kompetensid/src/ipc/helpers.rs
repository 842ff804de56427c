use super::error::{api_err, err};
use super::types::{AppState, Request};
use crate::api::ApiError;
use crate::calc::CompetencyKind;
use crate::guard;
use crate::session;
use chrono::Datelike;
use log::{error, info};
use serde_json::Value;

pub const MIN_YEAR: i64 = 2000;
pub const MAX_YEAR: i64 = 2100;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    str_param(req, key)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing params.{key}"), None))
}

/// Ids and NIKs may come from the UI as strings or numbers.
pub fn id_param(req: &Request, key: &str) -> Result<String, Value> {
    match req.params.get(key) {
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => required_str(req, key).map(str::to_string),
    }
}

/// Raw (untrimmed) string, for passwords.
pub fn raw_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Years arrive as numbers or numeric strings from form inputs.
pub fn year_param(req: &Request, key: &str) -> Result<Option<i64>, Value> {
    let Some(v) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    if v.as_str().map(|s| s.trim().is_empty()).unwrap_or(false) {
        return Ok(None);
    }
    let year = crate::lenient::int_from_value(v).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("params.{key} must be a year"),
            Some(serde_json::json!({ key: v })),
        )
    })?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(err(
            &req.id,
            "bad_params",
            format!("params.{key} must be between {MIN_YEAR} and {MAX_YEAR}"),
            Some(serde_json::json!({ key: year })),
        ));
    }
    Ok(Some(year))
}

pub fn current_year() -> i64 {
    chrono::Local::now().year() as i64
}

pub fn u32_param(req: &Request, key: &str) -> Result<Option<u32>, Value> {
    let Some(v) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    crate::lenient::int_from_value(v)
        .filter(|n| *n >= 0 && *n <= u32::MAX as i64)
        .map(|n| Some(n as u32))
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("params.{key} must be a non-negative integer"),
                None,
            )
        })
}

pub fn kind_param(req: &Request, key: &str) -> Result<CompetencyKind, Value> {
    let raw = required_str(req, key)?;
    CompetencyKind::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("params.{key} must be one of: hard, soft"),
            Some(serde_json::json!({ key: raw })),
        )
    })
}

/// Every request naming a channel supersedes the previous one on it, whether
/// or not it succeeded. The ticket goes into `result`, or into
/// `error.details` for a failed reply.
pub fn stamp_ticket(state: &mut AppState, req: &Request, mut resp: Value) -> Value {
    if req.method == "tickets.isCurrent" {
        return resp;
    }
    let Some(channel) = str_param(req, "channel") else {
        return resp;
    };
    let ticket = state.tickets.issue(channel);
    let target = if resp["ok"] == Value::Bool(true) {
        &mut resp["result"]
    } else {
        let details = &mut resp["error"]["details"];
        if details.is_null() {
            *details = Value::Object(serde_json::Map::new());
        }
        details
    };
    if let Value::Object(map) = target {
        map.insert("channel".to_string(), Value::String(channel.to_string()));
        map.insert("ticket".to_string(), Value::String(ticket.to_string()));
    }
    resp
}

/// Writes the in-memory session to the workspace database, if one is open.
pub fn persist_session(state: &AppState) {
    let Some(conn) = state.db.as_ref() else {
        return;
    };
    if let Err(e) = session::save(conn, &state.session) {
        error!("event=session_persist status=error detail={e}");
    }
}

/// Converts a client error into a response, persisting the cleared session
/// when the error ended it.
pub fn client_failure(state: &mut AppState, req: &Request, e: ApiError) -> Value {
    if e.ends_session() {
        state.session.clear();
        state.tickets.clear();
        persist_session(state);
        info!("event=session_cleared reason={} method={}", e.code(), req.method);
    }
    api_err(&req.id, &e)
}

pub fn require_session(state: &AppState, req: &Request) -> Result<(), Value> {
    if state.session.is_authenticated() {
        return Ok(());
    }
    Err(api_err(&req.id, &ApiError::Unauthenticated))
}

/// Authorization failures carry no message for the user, only where to go.
pub fn require_admin(state: &AppState, req: &Request) -> Result<(), Value> {
    require_session(state, req)?;
    if state.session.is_admin() {
        return Ok(());
    }
    Err(err(
        &req.id,
        "forbidden",
        "",
        Some(serde_json::json!({
            "redirect": guard::DASHBOARD_PATH
        })),
    ))
}
