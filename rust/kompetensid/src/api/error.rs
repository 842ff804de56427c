use serde_json::Value;

pub const SESSION_EXPIRED_MESSAGE: &str = "Sesi Anda telah berakhir. Silakan login kembali.";
pub const UNAUTHENTICATED_MESSAGE: &str = "Silakan login terlebih dahulu.";
pub const NETWORK_MESSAGE: &str = "Tidak dapat terhubung ke server. Periksa koneksi Anda.";
pub const BAD_RESPONSE_MESSAGE: &str = "Respons server tidak dapat dibaca.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 401 on an authenticated call. The session has been cleared.
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    /// No token to send; the call was not attempted.
    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    Unauthenticated,
    #[error("{message}")]
    Backend {
        status: u16,
        message: String,
        body: Value,
    },
    #[error("{}", NETWORK_MESSAGE)]
    Network { detail: String },
    #[error("{}", BAD_RESPONSE_MESSAGE)]
    BadResponse { detail: String },
    #[error("{0}")]
    InvalidInput(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::SessionExpired => "session_expired",
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Backend { .. } => "backend_error",
            ApiError::Network { .. } => "network_error",
            ApiError::BadResponse { .. } => "bad_response",
            ApiError::InvalidInput(_) => "bad_params",
        }
    }

    /// Errors after which the caller must treat the user as signed out.
    pub fn ends_session(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::Unauthenticated)
    }

    pub(crate) fn bad_response(detail: impl Into<String>) -> Self {
        ApiError::BadResponse {
            detail: detail.into(),
        }
    }
}

fn non_empty(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_validation_message(errors: &Value) -> Option<String> {
    match errors {
        Value::String(_) => non_empty(errors),
        Value::Array(items) => items.iter().find_map(first_validation_message),
        Value::Object(fields) => fields.values().find_map(first_validation_message),
        _ => None,
    }
}

/// Human-readable message from an error body: `message`, then the first
/// entry of `errors`, then `error`.
pub fn extract_message(body: &Value) -> Option<String> {
    if let Some(m) = body.get("message").and_then(non_empty) {
        return Some(m);
    }
    if let Some(m) = body.get("errors").and_then(first_validation_message) {
        return Some(m);
    }
    body.get("error")
        .and_then(|e| non_empty(e).or_else(|| e.get("message").and_then(non_empty)))
}
