//! Session store: bearer token, role, must-change-password flag and the
//! signed-in user record.
//!
//! The session is a plain value owned by the caller. Persistence mirrors the
//! browser layout (three cookies plus one local-storage entry) in the
//! workspace database; see [`load`], [`save`] and [`clear_persisted`].

use crate::db;
use crate::guard::{self, SessionView};
use crate::lenient;
use crate::logging::fingerprint;
use rusqlite::Connection;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

pub const COOKIE_TOKEN: &str = "token";
pub const COOKIE_ROLE: &str = "role";
pub const COOKIE_MUST_CHANGE: &str = "must_change_password";
pub const STORAGE_USER: &str = "user";

const MAX_TOKEN_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Karyawan,
    Admin,
}

impl Role {
    /// Anything other than `admin` is an employee.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Karyawan
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Karyawan => "karyawan",
            Role::Admin => "admin",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        Ok(v.as_str().map(Role::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SessionUser {
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::opt_id_string")]
    pub nik: Option<String>,
    #[serde(alias = "nama")]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(
        default,
        alias = "mustChangePassword",
        deserialize_with = "lenient::flag"
    )]
    pub must_change_password: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("token is empty or malformed")]
    MalformedToken,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    role: Role,
    must_change_password: bool,
    user: Option<SessionUser>,
}

/// Opaque bearer tokens: printable ASCII, no whitespace, bounded length.
pub fn is_well_formed_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_BYTES
        && token.bytes().all(|b| b.is_ascii_graphic())
}

impl Session {
    pub fn anonymous() -> Self {
        Session::default()
    }

    /// Builds a signed-in session. The role comes from the user record; an
    /// admin never carries the must-change-password flag.
    pub fn create(
        token: &str,
        user: SessionUser,
        must_change_password: bool,
    ) -> Result<Self, SessionError> {
        if !is_well_formed_token(token) {
            return Err(SessionError::MalformedToken);
        }
        let role = user.role;
        Ok(Session {
            token: Some(token.to_string()),
            role,
            must_change_password: must_change_password && role != Role::Admin,
            user: Some(user),
        })
    }

    /// Rebuilds a session from stored cookie values. Missing or unreadable
    /// parts read as falsy; a malformed token means no session at all.
    pub fn from_parts(
        token: Option<&str>,
        role: Option<&str>,
        must_change_password: Option<&str>,
        user: Option<Value>,
    ) -> Self {
        let Some(token) = token.filter(|t| is_well_formed_token(t)) else {
            return Session::anonymous();
        };
        let role = role.map(Role::parse).unwrap_or_default();
        let must_change = must_change_password
            .and_then(|raw| lenient::flag_from_value(&Value::String(raw.to_string())))
            .unwrap_or(false);
        let user = user.and_then(|v| serde_json::from_value::<SessionUser>(v).ok());
        Session {
            token: Some(token.to_string()),
            role,
            must_change_password: must_change && role != Role::Admin,
            user,
        }
    }

    pub fn clear(&mut self) {
        *self = Session::anonymous();
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.token.is_some() && self.role == Role::Admin
    }

    pub fn must_change_password(&self) -> bool {
        self.must_change_password
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Replaces the user record after a profile refresh. Role and the
    /// must-change flag stay as stored at login; only
    /// [`Session::mark_password_changed`] lifts the flag.
    pub fn refresh_user(&mut self, user: SessionUser) {
        if self.token.is_none() {
            return;
        }
        self.user = Some(user);
    }

    pub fn mark_password_changed(&mut self) {
        self.must_change_password = false;
        if let Some(u) = self.user.as_mut() {
            u.must_change_password = false;
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            authenticated: self.is_authenticated(),
            is_admin: self.is_admin(),
            must_change_password: self.must_change_password,
        }
    }

    /// Public shape for the UI. The token itself never leaves the daemon.
    pub fn to_json(&self) -> Value {
        let landing = if self.is_authenticated() {
            guard::landing_path(&self.view())
        } else {
            guard::LOGIN_PATH
        };
        json!({
            "authenticated": self.is_authenticated(),
            "role": self.role.as_str(),
            "isAdmin": self.is_admin(),
            "mustChangePassword": self.must_change_password,
            "user": self.user,
            "tokenFingerprint": self.token.as_deref().map(fingerprint),
            "landingPath": landing,
        })
    }
}

pub fn load(conn: &Connection) -> anyhow::Result<Session> {
    let token = db::cookie_get(conn, COOKIE_TOKEN)?;
    let role = db::cookie_get(conn, COOKIE_ROLE)?;
    let must_change = db::cookie_get(conn, COOKIE_MUST_CHANGE)?;
    let user = db::storage_get_json(conn, STORAGE_USER)?;
    Ok(Session::from_parts(
        token.as_deref(),
        role.as_deref(),
        must_change.as_deref(),
        user,
    ))
}

pub fn save(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let Some(token) = session.token() else {
        return clear_persisted(conn);
    };
    let must_change = session.must_change_password && session.role != Role::Admin;
    db::cookie_set(conn, COOKIE_TOKEN, token)?;
    db::cookie_set(conn, COOKIE_ROLE, session.role.as_str())?;
    db::cookie_set(conn, COOKIE_MUST_CHANGE, if must_change { "true" } else { "false" })?;
    match session.user() {
        Some(u) => db::storage_set_json(conn, STORAGE_USER, &serde_json::to_value(u)?)?,
        None => db::storage_delete(conn, STORAGE_USER)?,
    }
    Ok(())
}

pub fn clear_persisted(conn: &Connection) -> anyhow::Result<()> {
    db::cookie_delete(conn, COOKIE_TOKEN)?;
    db::cookie_delete(conn, COOKIE_ROLE)?;
    db::cookie_delete(conn, COOKIE_MUST_CHANGE)?;
    db::storage_delete(conn, STORAGE_USER)?;
    Ok(())
}
