use super::types::{Employee, HardCompetency, SoftCompetency};
use super::{ApiClient, ApiError, ApiRequest};
use crate::session::Session;

const HARD_FAILED: &str = "Gagal memuat data hard competency.";
const SOFT_FAILED: &str = "Gagal memuat data soft competency.";
const PROFILE_FAILED: &str = "Gagal memuat profil.";

/// Employee self-service endpoints.
impl ApiClient {
    pub fn own_hard_competencies(
        &self,
        session: &mut Session,
        tahun: Option<i64>,
    ) -> Result<Vec<HardCompetency>, ApiError> {
        self.fetch(
            session,
            ApiRequest::get("/karyawan/kompetensi/hard").query_opt("tahun", tahun),
            HARD_FAILED,
        )
    }

    pub fn own_soft_competencies(
        &self,
        session: &mut Session,
        tahun: Option<i64>,
    ) -> Result<Vec<SoftCompetency>, ApiError> {
        self.fetch(
            session,
            ApiRequest::get("/karyawan/kompetensi/soft").query_opt("tahun", tahun),
            SOFT_FAILED,
        )
    }

    pub fn own_profile(&self, session: &mut Session) -> Result<Employee, ApiError> {
        self.fetch(session, ApiRequest::get("/karyawan/profile"), PROFILE_FAILED)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{client, ScriptedTransport};
    use crate::session::{Session, SessionUser};
    use serde_json::json;

    fn signed_in() -> Session {
        let user: SessionUser =
            serde_json::from_value(json!({"id": 4, "nama": "Andi"})).expect("user");
        Session::create("tok-k", user, false).expect("session")
    }

    #[test]
    fn hard_list_accepts_wrapped_and_bare_bodies() {
        let rows = json!([
            {"id": 1, "nama_kompetensi": "K3", "tahun": 2024, "nilai": 90, "status": "tercapai"},
            {"id": 2, "nama_kompetensi": "SOP", "tahun": "2024", "nilai": null, "status": "tidak_tercapai"}
        ]);
        let t = ScriptedTransport::default()
            .reply(200, json!({ "data": rows.clone() }))
            .reply(200, rows);
        let c = client(&t);
        let mut s = signed_in();
        let wrapped = c.own_hard_competencies(&mut s, Some(2024)).expect("wrapped");
        let bare = c.own_hard_competencies(&mut s, None).expect("bare");
        assert_eq!(wrapped.len(), 2);
        assert_eq!(bare[1].score, None);
        let seen = t.requests();
        assert_eq!(seen[0].query, vec![("tahun".to_string(), "2024".to_string())]);
        assert!(seen[1].query.is_empty());
    }

    #[test]
    fn shape_mismatch_is_bad_response() {
        let t = ScriptedTransport::default().reply(200, json!({"data": {"rows": "nope"}}));
        let mut s = signed_in();
        let err = client(&t)
            .own_soft_competencies(&mut s, None)
            .expect_err("mismatch");
        assert_eq!(err.code(), "bad_response");
    }
}
