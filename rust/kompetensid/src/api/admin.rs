use super::transport::{FilePart, Method, RequestBody};
use super::types::{
    Employee, EmployeeInput, HardCompetency, ImportLog, ImportReport, MasterItem, Paginated,
    SoftCompetency,
};
use super::{parse_payload, ApiClient, ApiError, ApiRequest, CallPolicy};
use crate::calc::CompetencyKind;
use crate::session::Session;
use log::info;
use serde_json::Value;

const EMPLOYEES_FAILED: &str = "Gagal memuat data karyawan.";
const EMPLOYEE_FAILED: &str = "Gagal memuat detail karyawan.";
const EMPLOYEE_SAVE_FAILED: &str = "Gagal menyimpan data karyawan.";
const EMPLOYEE_DELETE_FAILED: &str = "Gagal menghapus karyawan.";
const COMPETENCY_FAILED: &str = "Gagal memuat data kompetensi karyawan.";
pub const IMPORT_FAILED: &str = "Import gagal. Silakan coba lagi.";
const IMPORT_LOGS_FAILED: &str = "Gagal memuat riwayat import.";
const IMPORT_CANCEL_FAILED: &str = "Gagal membatalkan import.";
const MASTER_FAILED: &str = "Gagal memuat data master.";

#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

/// A competency spreadsheet ready to upload.
#[derive(Debug, Clone)]
pub struct ImportUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub tahun: i64,
    pub jenis: CompetencyKind,
}

/// NIKs go into URL paths; keep them to plain digits and letters.
fn nik_segment(nik: &str) -> Result<&str, ApiError> {
    let nik = nik.trim();
    if nik.is_empty() || !nik.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::InvalidInput("NIK tidak valid.".to_string()));
    }
    Ok(nik)
}

fn id_segment(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ApiError::InvalidInput("ID tidak valid.".to_string()));
    }
    Ok(id)
}

impl ApiClient {
    pub fn employees(
        &self,
        session: &mut Session,
        q: &EmployeeQuery,
    ) -> Result<Paginated<Employee>, ApiError> {
        let search = q
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let reply = self.execute(
            session,
            ApiRequest::get("/admin/karyawan")
                .query("page", q.page.max(1))
                .query("per_page", q.per_page.max(1))
                .query_opt("search", search),
            CallPolicy::AUTHENTICATED,
            EMPLOYEES_FAILED,
        )?;
        super::parse_exact(reply.body)
    }

    pub fn employee(&self, session: &mut Session, nik: &str) -> Result<Employee, ApiError> {
        let nik = nik_segment(nik)?;
        self.fetch(
            session,
            ApiRequest::get(format!("/admin/karyawan/{nik}")),
            EMPLOYEE_FAILED,
        )
    }

    pub fn create_employee(
        &self,
        session: &mut Session,
        input: &EmployeeInput,
    ) -> Result<Employee, ApiError> {
        input.validate(true).map_err(ApiError::InvalidInput)?;
        let body = serde_json::to_value(input).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let reply = self.execute(
            session,
            ApiRequest::post("/admin/karyawan").json(body),
            CallPolicy::AUTHENTICATED,
            EMPLOYEE_SAVE_FAILED,
        )?;
        info!("event=employee_created");
        parse_payload(reply.body)
    }

    pub fn update_employee(
        &self,
        session: &mut Session,
        nik: &str,
        input: &EmployeeInput,
    ) -> Result<Employee, ApiError> {
        let nik = nik_segment(nik)?;
        input.validate(false).map_err(ApiError::InvalidInput)?;
        let body = serde_json::to_value(input).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let reply = self.execute(
            session,
            ApiRequest::new(Method::Put, format!("/admin/karyawan/{nik}")).json(body),
            CallPolicy::AUTHENTICATED,
            EMPLOYEE_SAVE_FAILED,
        )?;
        parse_payload(reply.body)
    }

    /// Returns the backend's confirmation message, if any.
    pub fn delete_employee(&self, session: &mut Session, nik: &str) -> Result<Option<String>, ApiError> {
        let nik = nik_segment(nik)?;
        let reply = self.execute(
            session,
            ApiRequest::new(Method::Delete, format!("/admin/karyawan/{nik}")),
            CallPolicy::AUTHENTICATED,
            EMPLOYEE_DELETE_FAILED,
        )?;
        info!("event=employee_deleted");
        Ok(reply
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn employee_hard_competencies(
        &self,
        session: &mut Session,
        nik: &str,
        tahun: Option<i64>,
    ) -> Result<Vec<HardCompetency>, ApiError> {
        let nik = nik_segment(nik)?;
        self.fetch(
            session,
            ApiRequest::get(format!("/admin/karyawan/{nik}/kompetensi/hard")).query_opt("tahun", tahun),
            COMPETENCY_FAILED,
        )
    }

    pub fn employee_soft_competencies(
        &self,
        session: &mut Session,
        nik: &str,
        tahun: Option<i64>,
    ) -> Result<Vec<SoftCompetency>, ApiError> {
        let nik = nik_segment(nik)?;
        self.fetch(
            session,
            ApiRequest::get(format!("/admin/karyawan/{nik}/kompetensi/soft")).query_opt("tahun", tahun),
            COMPETENCY_FAILED,
        )
    }

    /// Uploads a competency spreadsheet. A 422 reply is a partial import and
    /// comes back as `Ok` with the body intact.
    pub fn import_competencies(
        &self,
        session: &mut Session,
        upload: ImportUpload,
    ) -> Result<ImportReport, ApiError> {
        let jenis = upload.jenis.as_str();
        let size = upload.bytes.len();
        let req = ApiRequest {
            method: Method::Post,
            path: "/admin/kompetensi/import".to_string(),
            query: Vec::new(),
            body: RequestBody::Multipart {
                fields: vec![
                    ("tahun".to_string(), upload.tahun.to_string()),
                    ("jenis".to_string(), jenis.to_string()),
                ],
                file: FilePart {
                    field: "file".to_string(),
                    file_name: upload.file_name,
                    mime: upload.mime,
                    bytes: upload.bytes,
                },
            },
        };
        let reply = self.execute(session, req, CallPolicy::IMPORT, IMPORT_FAILED)?;
        let report = ImportReport::from_body(reply.status, reply.body);
        info!(
            "event=competency_import jenis={} tahun={} bytes={} http_status={} sukses={} gagal={}",
            jenis, upload.tahun, size, report.status, report.sukses, report.gagal
        );
        Ok(report)
    }

    pub fn import_logs(
        &self,
        session: &mut Session,
        page: u32,
    ) -> Result<Paginated<ImportLog>, ApiError> {
        let reply = self.execute(
            session,
            ApiRequest::get("/admin/import-logs").query("page", page.max(1)),
            CallPolicy::AUTHENTICATED,
            IMPORT_LOGS_FAILED,
        )?;
        super::parse_exact(reply.body)
    }

    pub fn cancel_import(&self, session: &mut Session, id: &str) -> Result<Option<String>, ApiError> {
        let id = id_segment(id)?;
        let reply = self.execute(
            session,
            ApiRequest::post(format!("/admin/import-logs/{id}/cancel")),
            CallPolicy::AUTHENTICATED,
            IMPORT_CANCEL_FAILED,
        )?;
        info!("event=import_cancelled id={}", id);
        Ok(reply
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn units(&self, session: &mut Session) -> Result<Vec<MasterItem>, ApiError> {
        self.fetch(session, ApiRequest::get("/admin/master/units"), MASTER_FAILED)
    }

    pub fn cities(&self, session: &mut Session) -> Result<Vec<MasterItem>, ApiError> {
        self.fetch(session, ApiRequest::get("/admin/master/cities"), MASTER_FAILED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{client, ScriptedTransport};
    use crate::api::ImportOutcome;
    use crate::session::SessionUser;
    use serde_json::json;

    fn admin() -> Session {
        let user: SessionUser =
            serde_json::from_value(json!({"id": 1, "nama": "Admin", "role": "admin"})).expect("user");
        Session::create("tok-admin", user, false).expect("session")
    }

    fn upload() -> ImportUpload {
        ImportUpload {
            file_name: "hard-2024.xlsx".to_string(),
            mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            bytes: b"PK\x03\x04fake".to_vec(),
            tahun: 2024,
            jenis: CompetencyKind::Hard,
        }
    }

    #[test]
    fn import_422_resolves_with_body_intact() {
        let body = json!({"message": "Import selesai dengan error", "sukses": 5, "gagal": 2});
        let t = ScriptedTransport::default().reply(422, body.clone());
        let mut s = admin();
        let report = client(&t)
            .import_competencies(&mut s, upload())
            .expect("partial success");
        assert_eq!(report.outcome, ImportOutcome::Partial);
        assert_eq!(report.body, body);
        assert_eq!((report.sukses, report.gagal), (5, 2));

        let seen = t.requests();
        match &seen[0].body {
            RequestBody::Multipart { fields, file } => {
                assert!(fields.contains(&("tahun".to_string(), "2024".to_string())));
                assert!(fields.contains(&("jenis".to_string(), "hard".to_string())));
                assert_eq!(file.field, "file");
                assert_eq!(file.file_name, "hard-2024.xlsx");
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn import_422_with_empty_body_still_resolves() {
        let t = ScriptedTransport::default().reply_raw(422, "");
        let mut s = admin();
        let report = client(&t)
            .import_competencies(&mut s, upload())
            .expect("partial success");
        assert_eq!(report.outcome, ImportOutcome::Partial);
        assert_eq!(report.body, Value::Null);
        assert_eq!((report.sukses, report.gagal), (0, 0));
    }

    #[test]
    fn import_500_uses_message_or_default() {
        let t = ScriptedTransport::default()
            .reply(500, json!({"message": "Format file tidak sesuai template"}))
            .reply(500, json!({}));
        let c = client(&t);
        let mut s = admin();
        let err = c.import_competencies(&mut s, upload()).expect_err("500");
        assert_eq!(err.to_string(), "Format file tidak sesuai template");
        let err = c.import_competencies(&mut s, upload()).expect_err("500");
        assert_eq!(err.to_string(), IMPORT_FAILED);
    }

    #[test]
    fn nik_is_checked_before_building_a_path() {
        let t = ScriptedTransport::default();
        let mut s = admin();
        let err = client(&t).employee(&mut s, "../etc").expect_err("bad nik");
        assert_eq!(err.code(), "bad_params");
        assert!(t.requests().is_empty());
    }

    #[test]
    fn employee_list_sends_page_and_search() {
        let t = ScriptedTransport::default().reply(
            200,
            json!({
                "data": [{"id": 5, "nik": "3201005", "nama": "Citra", "role": "karyawan"}],
                "current_page": 2, "last_page": 3, "per_page": 1, "total": 3
            }),
        );
        let mut s = admin();
        let page = client(&t)
            .employees(
                &mut s,
                &EmployeeQuery {
                    page: 2,
                    per_page: 1,
                    search: Some("  cit ".to_string()),
                },
            )
            .expect("page");
        assert_eq!(page.data[0].nik, "3201005");
        assert!(page.page_info().has_next);
        let q = &t.requests()[0].query;
        assert!(q.contains(&("search".to_string(), "cit".to_string())));
        assert!(q.contains(&("page".to_string(), "2".to_string())));
    }
}
