use crate::api::ApiError;
use crate::guard;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps a client error onto the IPC error shape. Auth failures carry the
/// page the UI should navigate to.
pub fn api_err(id: &str, e: &ApiError) -> serde_json::Value {
    let details = match e {
        ApiError::SessionExpired | ApiError::Unauthenticated => {
            Some(json!({ "redirect": guard::LOGIN_PATH }))
        }
        ApiError::Backend { status, body, .. } => Some(json!({
            "status": status,
            "errors": body.get("errors").cloned(),
        })),
        ApiError::Network { detail } | ApiError::BadResponse { detail } => {
            Some(json!({ "detail": detail }))
        }
        ApiError::InvalidInput(_) => None,
    };
    err(id, e.code(), e.to_string(), details)
}
