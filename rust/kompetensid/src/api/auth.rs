use super::types::LoginResponse;
use super::{parse_exact, ApiClient, ApiError, ApiRequest, CallPolicy};
use crate::session::{Session, SessionUser};
use log::info;
use serde_json::json;

const LOGIN_FAILED: &str = "Login gagal. Periksa NIK dan password Anda.";
const ME_FAILED: &str = "Gagal memuat data pengguna.";
const LOGOUT_FAILED: &str = "Gagal logout.";
const CHANGE_PASSWORD_FAILED: &str = "Gagal mengganti password.";

pub const MIN_PASSWORD_LEN: usize = 8;

impl ApiClient {
    /// Exchanges credentials for a token and replaces `session` with the new
    /// signed-in session.
    pub fn login(&self, session: &mut Session, nik: &str, password: &str) -> Result<(), ApiError> {
        if nik.trim().is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput(
                "NIK dan password wajib diisi.".to_string(),
            ));
        }
        // A stale token must not ride along on the login request.
        session.clear();
        let reply = self.execute(
            session,
            ApiRequest::post("/login").json(json!({ "nik": nik.trim(), "password": password })),
            CallPolicy::LOGIN,
            LOGIN_FAILED,
        )?;
        let body = reply
            .body
            .get("data")
            .filter(|d| d.get("token").is_some() || d.get("access_token").is_some())
            .cloned()
            .unwrap_or(reply.body);
        let login: LoginResponse = parse_exact(body)?;
        let must_change = login.must_change_password();
        *session = Session::create(&login.token, login.user, must_change)
            .map_err(|e| ApiError::bad_response(e.to_string()))?;
        info!(
            "event=login status=ok role={} must_change_password={}",
            session.role().as_str(),
            session.must_change_password()
        );
        Ok(())
    }

    /// Refreshes the user record from the backend.
    pub fn me(&self, session: &mut Session) -> Result<SessionUser, ApiError> {
        let user: SessionUser = self.fetch(session, ApiRequest::get("/me"), ME_FAILED)?;
        session.refresh_user(user.clone());
        Ok(user)
    }

    /// Ends the session locally whatever the backend says.
    pub fn logout(&self, session: &mut Session) -> Result<(), ApiError> {
        if !session.is_authenticated() {
            return Ok(());
        }
        let result = self.execute(
            session,
            ApiRequest::post("/logout"),
            CallPolicy::AUTHENTICATED,
            LOGOUT_FAILED,
        );
        session.clear();
        match result {
            Ok(_) | Err(ApiError::SessionExpired) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn change_password(
        &self,
        session: &mut Session,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Option<String>, ApiError> {
        if current.is_empty() || new_password.is_empty() {
            return Err(ApiError::InvalidInput(
                "Password lama dan password baru wajib diisi.".to_string(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidInput(format!(
                "Password baru minimal {MIN_PASSWORD_LEN} karakter."
            )));
        }
        if new_password != confirmation {
            return Err(ApiError::InvalidInput(
                "Konfirmasi password tidak cocok.".to_string(),
            ));
        }
        if new_password == current {
            return Err(ApiError::InvalidInput(
                "Password baru harus berbeda dari password lama.".to_string(),
            ));
        }
        let reply = self.execute(
            session,
            ApiRequest::post("/change-password").json(json!({
                "current_password": current,
                "new_password": new_password,
                "new_password_confirmation": confirmation,
            })),
            CallPolicy::AUTHENTICATED,
            CHANGE_PASSWORD_FAILED,
        )?;
        session.mark_password_changed();
        // Some backends rotate the token on password change.
        if let Some(token) = reply
            .body
            .get("token")
            .and_then(|t| t.as_str())
            .filter(|t| crate::session::is_well_formed_token(t))
        {
            if let Some(user) = session.user().cloned() {
                *session = Session::create(token, user, false)
                    .map_err(|e| ApiError::bad_response(e.to_string()))?;
            }
        }
        let message = reply
            .body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        Ok(message)
    }
}
