use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{client_failure, persist_session, raw_str, required_str, require_session};
use crate::ipc::types::{AppState, Request};
use log::info;
use serde_json::json;

fn session_result(state: &AppState) -> serde_json::Value {
    let session = state.session.to_json();
    json!({
        "landingPath": session["landingPath"].clone(),
        "session": session,
    })
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let nik = match required_str(req, "nik") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let Some(password) = raw_str(req, "password").filter(|p| !p.is_empty()) else {
        return err(&req.id, "bad_params", "missing params.password", None);
    };
    let password = password.to_string();
    match state.client.login(&mut state.session, &nik, &password) {
        Ok(()) => {
            state.tickets.clear();
            persist_session(state);
            ok(&req.id, session_result(state))
        }
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_me(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    match state.client.me(&mut state.session) {
        Ok(user) => {
            persist_session(state);
            ok(
                &req.id,
                json!({ "user": user, "session": state.session.to_json() }),
            )
        }
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = state.client.logout(&mut state.session);
    state.tickets.clear();
    persist_session(state);
    info!("event=logout");
    match result {
        Ok(()) => ok(&req.id, session_result(state)),
        // The local session is gone either way; report the backend failure
        // without a redirect loop.
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_change_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let current = raw_str(req, "currentPassword").unwrap_or("").to_string();
    let new_password = raw_str(req, "newPassword").unwrap_or("").to_string();
    let confirmation = raw_str(req, "newPasswordConfirmation")
        .unwrap_or("")
        .to_string();
    match state
        .client
        .change_password(&mut state.session, &current, &new_password, &confirmation)
    {
        Ok(message) => {
            persist_session(state);
            let mut result = session_result(state);
            result["message"] = json!(message);
            ok(&req.id, result)
        }
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_result(state))
}

fn handle_session_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.clear();
    state.tickets.clear();
    persist_session(state);
    info!("event=session_cleared reason=requested");
    ok(&req.id, session_result(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.me" => Some(handle_me(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.changePassword" => Some(handle_change_password(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        "session.clear" => Some(handle_session_clear(state, req)),
        _ => None,
    }
}
