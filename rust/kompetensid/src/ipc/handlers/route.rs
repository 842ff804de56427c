use crate::guard;
use crate::ipc::error::ok;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_route_decide(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let view = state.session.view();
    let decision = guard::decide(&view, raw);
    ok(
        &req.id,
        json!({
            "path": guard::normalize_path(raw),
            "decision": decision,
            "redirect": decision.redirect_target(),
            "session": {
                "authenticated": view.authenticated,
                "isAdmin": view.is_admin,
                "mustChangePassword": view.must_change_password,
            },
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "route.decide" => Some(handle_route_decide(state, req)),
        _ => None,
    }
}
