//! Route gating for the dashboard.
//!
//! `decide` is a pure function of the session flags and the target path; the
//! caller performs the actual navigation.

use serde::Serialize;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const PASSWORD_PATH: &str = "/dashboard/password";
pub const ADMIN_PREFIX: &str = "/admin";

/// The three session facts the guard looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionView {
    pub authenticated: bool,
    pub is_admin: bool,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    Unauthenticated,
    Forbidden,
    MustChangePassword,
    AlreadyAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect { to: String, reason: RedirectReason },
}

impl RouteDecision {
    fn redirect(to: &str, reason: RedirectReason) -> Self {
        RouteDecision::Redirect {
            to: to.to_string(),
            reason,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::Redirect { to, .. } => Some(to.as_str()),
        }
    }
}

/// Where a signed-in user lands after login or when bounced off a page.
pub fn landing_path(session: &SessionView) -> &'static str {
    if session.must_change_password {
        PASSWORD_PATH
    } else {
        DASHBOARD_PATH
    }
}

/// Strips query/fragment and a trailing slash. Empty input becomes `/`.
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let mut path = raw[..end].trim().to_string();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

pub fn is_admin_path(path: &str) -> bool {
    under(path, ADMIN_PREFIX)
}

pub fn requires_auth(path: &str) -> bool {
    under(path, DASHBOARD_PATH) || is_admin_path(path)
}

pub fn decide(session: &SessionView, raw_path: &str) -> RouteDecision {
    let path = normalize_path(raw_path);

    if path == LOGIN_PATH {
        if session.authenticated {
            return RouteDecision::redirect(
                landing_path(session),
                RedirectReason::AlreadyAuthenticated,
            );
        }
        return RouteDecision::Allow;
    }

    if !requires_auth(&path) {
        return RouteDecision::Allow;
    }
    if !session.authenticated {
        return RouteDecision::redirect(LOGIN_PATH, RedirectReason::Unauthenticated);
    }
    if is_admin_path(&path) && !session.is_admin {
        return RouteDecision::redirect(DASHBOARD_PATH, RedirectReason::Forbidden);
    }
    if session.must_change_password && path != PASSWORD_PATH {
        return RouteDecision::redirect(PASSWORD_PATH, RedirectReason::MustChangePassword);
    }
    RouteDecision::Allow
}
