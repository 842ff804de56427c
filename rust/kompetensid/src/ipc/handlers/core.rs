use crate::config;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::session;
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

pub const SETTING_API_BASE_URL: &str = "api.baseUrl";

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "apiBaseUrl": state.client.base_url(),
            "authenticated": state.session.is_authenticated(),
        }),
    )
}

/// Opens (or creates) the session database under `path`, restores any stored
/// session and applies a stored API base URL override.
pub fn open_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<()> {
    let conn = db::open_db(&path)?;
    state.session = session::load(&conn)?;
    match db::settings_get_json(&conn, SETTING_API_BASE_URL) {
        Ok(Some(v)) => {
            if let Some(url) = v.as_str().and_then(|u| config::normalize_base_url(u).ok()) {
                state.client.set_base_url(&url);
                state.config.api_base_url = url;
            }
        }
        Ok(None) => {}
        // A broken setting must not prevent the workspace from opening.
        Err(e) => warn!("event=settings_read status=error key={SETTING_API_BASE_URL} detail={e}"),
    }
    info!(
        "event=workspace_open status=ok path={} session_restored={}",
        path.display(),
        state.session.is_authenticated()
    );
    state.workspace = Some(path);
    state.db = Some(conn);
    state.tickets.clear();
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = str_param(req, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    match open_workspace(state, path.clone()) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "session": state.session.to_json(),
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match serde_json::to_value(&state.config) {
        Ok(v) => ok(&req.id, json!({ "config": v })),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

fn handle_api_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match required_str(req, "baseUrl") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let url = match config::normalize_base_url(raw) {
        Ok(u) => u,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Some(conn) = state.db.as_ref() {
        if let Err(e) = db::settings_set_json(conn, SETTING_API_BASE_URL, &json!(url)) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    state.client.set_base_url(&url);
    state.config.api_base_url = url.clone();
    info!("event=api_base_url_updated url={url}");
    ok(
        &req.id,
        json!({ "apiBaseUrl": url, "persisted": state.db.is_some() }),
    )
}

fn handle_ticket_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let channel = match required_str(req, "channel") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let ticket = match required_str(req, "ticket").map(Uuid::parse_str) {
        Ok(Ok(t)) => t,
        Ok(Err(_)) => return err(&req.id, "bad_params", "params.ticket is not a ticket", None),
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({ "current": state.tickets.is_current(channel, &ticket) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "setup.api.update" => Some(handle_api_update(state, req)),
        "tickets.isCurrent" => Some(handle_ticket_check(state, req)),
        _ => None,
    }
}
