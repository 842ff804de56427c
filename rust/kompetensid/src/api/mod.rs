//! HTTP client for the HR backend.
//!
//! Every call goes through [`ApiClient::execute`], which attaches the bearer
//! token, turns 401 into a cleared session, and normalizes error bodies into
//! [`ApiError`]. Endpoint wrappers live in `auth`, `karyawan` and `admin`.

mod admin;
mod auth;
mod error;
mod karyawan;
mod transport;
mod types;

pub use admin::{EmployeeQuery, ImportUpload};
pub use error::ApiError;
pub use types::{EmployeeInput, HardCompetency, ImportOutcome, SoftCompetency};

use error::extract_message;
use transport::{HttpRequest, HttpTransport, Method, RequestBody, Transport};

use crate::config::Config;
use crate::session::Session;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use types::Payload;

/// How a single endpoint reacts to specific statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Send without a token instead of failing with `Unauthenticated`.
    pub anonymous: bool,
    /// 401 means the stored session is dead (false for the login call).
    pub unauthorized_ends_session: bool,
    /// 422 carries a partial-success body (import endpoints).
    pub unprocessable_is_partial: bool,
}

impl CallPolicy {
    pub const AUTHENTICATED: CallPolicy = CallPolicy {
        anonymous: false,
        unauthorized_ends_session: true,
        unprocessable_is_partial: false,
    };
    pub const LOGIN: CallPolicy = CallPolicy {
        anonymous: true,
        unauthorized_ends_session: false,
        unprocessable_is_partial: false,
    };
    pub const IMPORT: CallPolicy = CallPolicy {
        anonymous: false,
        unauthorized_ends_session: true,
        unprocessable_is_partial: true,
    };
}

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }
}

/// Raw outcome of a successful (or partial-success) call.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

pub struct ApiClient {
    base_url: String,
    transport: Box<dyn Transport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self::new(config.api_base_url.clone(), Box::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.trim_end_matches('/').to_string();
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Runs one call. `fallback` is the message used when an error body has
    /// nothing readable.
    pub fn execute(
        &self,
        session: &mut Session,
        req: ApiRequest,
        policy: CallPolicy,
        fallback: &str,
    ) -> Result<Reply, ApiError> {
        let bearer = session.token().map(str::to_string);
        if bearer.is_none() && !policy.anonymous {
            return Err(ApiError::Unauthenticated);
        }

        let method = req.method;
        let path = req.path.clone();
        let started = Instant::now();
        let resp = self
            .transport
            .execute(HttpRequest {
                method,
                url: self.url(&req.path),
                query: req.query,
                bearer,
                body: req.body,
            })
            .map_err(|e| {
                warn!(
                    "event=api_call status=network_error method={} path={} detail={}",
                    method.as_str(),
                    path,
                    crate::logging::sanitize_message(&e.0, 160)
                );
                ApiError::Network { detail: e.0 }
            })?;
        info!(
            "event=api_call method={} path={} http_status={} elapsed_ms={}",
            method.as_str(),
            path,
            resp.status,
            started.elapsed().as_millis()
        );

        let success = (200..300).contains(&resp.status);
        let body = if resp.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&resp.body) {
                Ok(v) => v,
                Err(e) if success => {
                    return Err(ApiError::bad_response(format!("invalid json: {e}")));
                }
                // Error pages (HTML from a proxy, etc.) fall back to the default message.
                Err(_) => Value::Null,
            }
        };

        if resp.status == 401 && policy.unauthorized_ends_session {
            info!("event=session_expired path={}", path);
            session.clear();
            return Err(ApiError::SessionExpired);
        }
        if success || (resp.status == 422 && policy.unprocessable_is_partial) {
            return Ok(Reply {
                status: resp.status,
                body,
            });
        }

        let message = extract_message(&body).unwrap_or_else(|| fallback.to_string());
        debug!(
            "event=api_error path={} http_status={} message={}",
            path,
            resp.status,
            crate::logging::sanitize_message(&message, 160)
        );
        Err(ApiError::Backend {
            status: resp.status,
            message,
            body,
        })
    }

    /// Authenticated call whose body is parsed into `T`, bare or under `data`.
    pub fn fetch<T: DeserializeOwned>(
        &self,
        session: &mut Session,
        req: ApiRequest,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let reply = self.execute(session, req, CallPolicy::AUTHENTICATED, fallback)?;
        parse_payload(reply.body)
    }
}

pub(crate) fn parse_payload<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value::<Payload<T>>(body)
        .map(Payload::into_inner)
        .map_err(|e| ApiError::bad_response(e.to_string()))
}

pub(crate) fn parse_exact<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value::<T>(body).map_err(|e| ApiError::bad_response(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::transport::{HttpResponse, TransportError};
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses in order and records every request.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        replies: Arc<Mutex<VecDeque<Result<HttpResponse, String>>>>,
        pub seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl ScriptedTransport {
        pub fn reply(self, status: u16, body: Value) -> Self {
            self.replies.lock().expect("lock").push_back(Ok(HttpResponse {
                status,
                body: body.to_string().into_bytes(),
            }));
            self
        }

        pub fn reply_raw(self, status: u16, body: &str) -> Self {
            self.replies.lock().expect("lock").push_back(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
            self
        }

        pub fn fail(self, detail: &str) -> Self {
            self.replies
                .lock()
                .expect("lock")
                .push_back(Err(detail.to_string()));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().expect("lock").clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().expect("lock").push(request);
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err("no scripted reply".to_string()))
                .map_err(TransportError)
        }
    }

    pub fn client(transport: &ScriptedTransport) -> ApiClient {
        ApiClient::new("http://backend.test/api/", Box::new(transport.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::error::SESSION_EXPIRED_MESSAGE;
    use super::testing::{client, ScriptedTransport};
    use super::*;
    use crate::session::SessionUser;
    use serde_json::json;

    fn signed_in() -> Session {
        let user: SessionUser =
            serde_json::from_value(json!({"id": 1, "nama": "Dewi", "role": "karyawan"}))
                .expect("user");
        Session::create("tok-abc", user, false).expect("session")
    }

    #[test]
    fn bearer_token_and_base_url_are_applied() {
        let t = ScriptedTransport::default().reply(200, json!({"data": []}));
        let c = client(&t);
        let mut s = signed_in();
        c.execute(
            &mut s,
            ApiRequest::get("/me").query("tahun", 2024),
            CallPolicy::AUTHENTICATED,
            "x",
        )
        .expect("ok");
        let seen = t.requests();
        assert_eq!(seen[0].url, "http://backend.test/api/me");
        assert_eq!(seen[0].bearer.as_deref(), Some("tok-abc"));
        assert_eq!(seen[0].query, vec![("tahun".to_string(), "2024".to_string())]);
    }

    #[test]
    fn missing_token_short_circuits() {
        let t = ScriptedTransport::default();
        let mut s = Session::anonymous();
        let err = client(&t)
            .execute(&mut s, ApiRequest::get("/me"), CallPolicy::AUTHENTICATED, "x")
            .expect_err("unauthenticated");
        assert!(matches!(err, ApiError::Unauthenticated));
        assert!(t.requests().is_empty());
    }

    #[test]
    fn unauthorized_clears_session() {
        let t = ScriptedTransport::default().reply(401, json!({"message": "Unauthenticated."}));
        let mut s = signed_in();
        let err = client(&t)
            .execute(&mut s, ApiRequest::get("/me"), CallPolicy::AUTHENTICATED, "x")
            .expect_err("expired");
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
        assert!(!s.is_authenticated());
    }

    #[test]
    fn login_unauthorized_keeps_backend_message() {
        let t = ScriptedTransport::default().reply(401, json!({"message": "NIK atau password salah"}));
        let mut s = Session::anonymous();
        let err = client(&t)
            .execute(&mut s, ApiRequest::post("/login"), CallPolicy::LOGIN, "x")
            .expect_err("rejected");
        assert_eq!(err.to_string(), "NIK atau password salah");
        assert!(matches!(err, ApiError::Backend { status: 401, .. }));
    }

    #[test]
    fn partial_only_under_import_policy() {
        let body = json!({"message": "Sebagian data gagal", "sukses": 5, "gagal": 2});
        let t = ScriptedTransport::default()
            .reply(422, body.clone())
            .reply(422, body.clone());
        let c = client(&t);
        let mut s = signed_in();
        let reply = c
            .execute(&mut s, ApiRequest::post("/x"), CallPolicy::IMPORT, "x")
            .expect("partial");
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body, body);
        let err = c
            .execute(&mut s, ApiRequest::post("/x"), CallPolicy::AUTHENTICATED, "x")
            .expect_err("validation");
        assert_eq!(err.code(), "backend_error");
    }

    #[test]
    fn unreadable_error_body_uses_fallback() {
        let t = ScriptedTransport::default()
            .reply_raw(502, "<html>Bad Gateway</html>")
            .reply_raw(200, "not json");
        let c = client(&t);
        let mut s = signed_in();
        let err = c
            .execute(&mut s, ApiRequest::get("/x"), CallPolicy::AUTHENTICATED, "Gagal memuat.")
            .expect_err("502");
        assert_eq!(err.to_string(), "Gagal memuat.");
        let err = c
            .execute(&mut s, ApiRequest::get("/x"), CallPolicy::AUTHENTICATED, "Gagal memuat.")
            .expect_err("bad json");
        assert_eq!(err.code(), "bad_response");
    }

    #[test]
    fn transport_failure_is_network_error() {
        let t = ScriptedTransport::default().fail("connection refused");
        let mut s = signed_in();
        let err = client(&t)
            .execute(&mut s, ApiRequest::get("/x"), CallPolicy::AUTHENTICATED, "x")
            .expect_err("network");
        assert_eq!(err.code(), "network_error");
        assert!(s.is_authenticated());
    }
}
