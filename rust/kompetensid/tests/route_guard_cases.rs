#[path = "../src/guard.rs"]
mod guard;

use guard::{decide, RedirectReason, RouteDecision, SessionView};

fn anonymous() -> SessionView {
    SessionView::default()
}

fn karyawan(must_change: bool) -> SessionView {
    SessionView {
        authenticated: true,
        is_admin: false,
        must_change_password: must_change,
    }
}

fn admin() -> SessionView {
    SessionView {
        authenticated: true,
        is_admin: true,
        must_change_password: false,
    }
}

fn redirect(to: &str, reason: RedirectReason) -> RouteDecision {
    RouteDecision::Redirect {
        to: to.to_string(),
        reason,
    }
}

#[test]
fn no_token_on_protected_pages_goes_to_login() {
    for path in ["/dashboard", "/dashboard/profile", "/admin", "/admin/karyawan/12"] {
        assert_eq!(
            decide(&anonymous(), path),
            redirect("/login", RedirectReason::Unauthenticated),
            "{path}"
        );
    }
    assert_eq!(decide(&anonymous(), "/login"), RouteDecision::Allow);
    assert_eq!(decide(&anonymous(), "/"), RouteDecision::Allow);
}

#[test]
fn karyawan_is_kept_out_of_admin() {
    assert_eq!(
        decide(&karyawan(false), "/admin"),
        redirect("/dashboard", RedirectReason::Forbidden)
    );
    assert_eq!(
        decide(&karyawan(false), "/admin/import?jenis=hard"),
        redirect("/dashboard", RedirectReason::Forbidden)
    );
    // Only whole segments count as the admin area.
    assert_eq!(decide(&karyawan(false), "/administrator"), RouteDecision::Allow);
    assert_eq!(decide(&admin(), "/admin/karyawan"), RouteDecision::Allow);
}

#[test]
fn must_change_password_pins_user_to_password_page() {
    assert_eq!(
        decide(&karyawan(true), "/dashboard/profile"),
        redirect("/dashboard/password", RedirectReason::MustChangePassword)
    );
    assert_eq!(
        decide(&karyawan(true), "/dashboard"),
        redirect("/dashboard/password", RedirectReason::MustChangePassword)
    );
    assert_eq!(decide(&karyawan(true), "/dashboard/password"), RouteDecision::Allow);
    assert_eq!(decide(&karyawan(true), "/dashboard/password/"), RouteDecision::Allow);
}

#[test]
fn signed_in_user_visiting_login_is_sent_to_landing_page() {
    assert_eq!(
        decide(&karyawan(false), "/login"),
        redirect("/dashboard", RedirectReason::AlreadyAuthenticated)
    );
    assert_eq!(
        decide(&karyawan(true), "/login"),
        redirect("/dashboard/password", RedirectReason::AlreadyAuthenticated)
    );
    assert_eq!(
        decide(&admin(), "/login?next=/admin"),
        redirect("/dashboard", RedirectReason::AlreadyAuthenticated)
    );
}

#[test]
fn admin_check_runs_before_password_check() {
    let view = karyawan(true);
    assert_eq!(
        decide(&view, "/admin/karyawan"),
        redirect("/dashboard", RedirectReason::Forbidden)
    );
}

#[test]
fn decision_serializes_with_action_tag() {
    let v = serde_json::to_value(decide(&anonymous(), "/dashboard")).expect("serialize");
    assert_eq!(v["action"], "redirect");
    assert_eq!(v["to"], "/login");
    assert_eq!(v["reason"], "unauthenticated");
    let v = serde_json::to_value(RouteDecision::Allow).expect("serialize");
    assert_eq!(v, serde_json::json!({ "action": "allow" }));
}
