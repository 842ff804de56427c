use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use crate::ipc::helpers::stamp_ticket;
use log::debug;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!("event=ipc_request method={} id={}", req.method, req.id);
    let resp = dispatch(state, &req);
    stamp_ticket(state, &req, resp)
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::session::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::route::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::stats::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::karyawan::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::admin::try_handle(state, req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
