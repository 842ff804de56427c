//! Response and request schemas for the HR backend.
//!
//! Backend field names are Indonesian snake_case; everything serialized back
//! to the UI is camelCase.

use crate::calc::{AchievementStatus, CompetencyRow};
use crate::lenient;
use crate::paging::PageInfo;
use crate::session::{Role, SessionUser};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bodies that come either bare or wrapped as `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: SessionUser,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub must_change_password: bool,
}

impl LoginResponse {
    /// The flag may be reported at the top level or on the user record.
    pub fn must_change_password(&self) -> bool {
        self.must_change_password || self.user.must_change_password
    }
}

fn achievement_status<'de, D>(deserializer: D) -> Result<Option<AchievementStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Null => Ok(None),
        Value::Bool(true) => Ok(Some(AchievementStatus::Achieved)),
        Value::Bool(false) => Ok(Some(AchievementStatus::NotAchieved)),
        Value::String(s) => {
            let norm = s.trim().to_lowercase().replace(['_', '-'], " ");
            match norm.as_str() {
                "tercapai" | "achieved" | "lulus" | "kompeten" => {
                    Ok(Some(AchievementStatus::Achieved))
                }
                "tidak tercapai" | "belum tercapai" | "not achieved" | "tidak lulus"
                | "belum kompeten" => Ok(Some(AchievementStatus::NotAchieved)),
                "" => Ok(None),
                _ => Err(de::Error::custom(format!("unknown competency status: {s}"))),
            }
        }
        _ => Err(de::Error::custom(format!("unknown competency status: {v}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct HardCompetency {
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    #[serde(alias = "nama_kompetensi", alias = "kompetensi", alias = "nama")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub tahun: Option<i64>,
    #[serde(default, alias = "nilai", deserialize_with = "lenient::opt_score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "achievement_status")]
    pub status: Option<AchievementStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HardCompetency {
    pub fn to_row(&self) -> CompetencyRow {
        CompetencyRow {
            identifier: self.name.clone(),
            status: self.status,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SoftCompetency {
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    #[serde(alias = "aspek", alias = "nama_aspek", alias = "nama")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub tahun: Option<i64>,
    #[serde(default, alias = "nilai", deserialize_with = "lenient::opt_score")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SoftCompetency {
    /// Soft rows carry no status; achievement is graded from the score.
    pub fn to_row(&self) -> CompetencyRow {
        CompetencyRow {
            identifier: self.name.clone(),
            status: None,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Employee {
    #[serde(default, deserialize_with = "lenient::opt_id_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::id_string")]
    pub nik: String,
    #[serde(alias = "nama")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub jabatan: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create/update payload. The UI sends camelCase; the backend wants
/// snake_case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct EmployeeInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jabatan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kota_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl EmployeeInput {
    pub fn validate(&self, creating: bool) -> Result<(), String> {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        if creating && blank(&self.nik) {
            return Err("NIK wajib diisi.".to_string());
        }
        if creating && blank(&self.nama) {
            return Err("Nama wajib diisi.".to_string());
        }
        if let Some(nik) = self.nik.as_deref() {
            if !nik.trim().chars().all(|c| c.is_ascii_digit()) {
                return Err("NIK hanya boleh berisi angka.".to_string());
            }
        }
        if let Some(role) = self.role.as_deref() {
            if !matches!(role, "admin" | "karyawan") {
                return Err("Role harus admin atau karyawan.".to_string());
            }
        }
        if let Some(email) = self.email.as_deref() {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err("Format email tidak valid.".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageNumbers {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub current_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub last_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub per_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub total: Option<i64>,
}

/// Laravel-style page: numbers at the top level or under `meta`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageNumbers>,
    #[serde(flatten)]
    pub top: PageNumbers,
}

impl<T> Paginated<T> {
    pub fn page_info(&self) -> PageInfo {
        let n = self.meta.as_ref().unwrap_or(&self.top);
        let len = self.data.len() as i64;
        let to_u32 = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
        let per_page = to_u32(n.per_page.unwrap_or(len).max(1));
        let total = n.total.unwrap_or(len).max(0) as u64;
        let last_page = n
            .last_page
            .map(to_u32)
            .unwrap_or_else(|| ((total + per_page as u64 - 1) / per_page as u64) as u32);
        PageInfo::new(
            to_u32(n.current_page.unwrap_or(1)),
            last_page,
            per_page,
            total,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Completed,
    Partial,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    pub status: u16,
    pub message: Option<String>,
    pub sukses: u64,
    pub gagal: u64,
    /// The backend's body, untouched.
    pub body: Value,
}

impl ImportReport {
    /// Never fails: a 422 resolves with whatever body came back. Counts are
    /// read from `data` or the top level; a list counts its rows and
    /// anything unreadable counts as zero.
    pub fn from_body(status: u16, body: Value) -> Self {
        let counts = body.get("data").filter(|d| d.is_object()).unwrap_or(&body);
        let count = |key: &str| -> u64 {
            match counts.get(key).or_else(|| body.get(key)) {
                Some(Value::Array(rows)) => rows.len() as u64,
                Some(v) => lenient::int_from_value(v)
                    .filter(|n| *n >= 0)
                    .map(|n| n as u64)
                    .unwrap_or(0),
                None => 0,
            }
        };
        let sukses = count("sukses");
        let gagal = count("gagal");
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        let outcome = if status == 422 {
            ImportOutcome::Partial
        } else {
            ImportOutcome::Completed
        };
        ImportReport {
            outcome,
            status,
            message,
            sukses,
            gagal,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ImportLog {
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    #[serde(default, alias = "nama_file", alias = "filename")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub jenis: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub tahun: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub sukses: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub gagal: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImportLog {
    pub fn cancellable(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("pending" | "queued" | "processing" | "diproses")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct MasterItem {
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    #[serde(alias = "nama", alias = "nama_unit", alias = "nama_kota")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hard_row_parses_indonesian_fields() {
        let row: HardCompetency = serde_json::from_value(json!({
            "id": 11,
            "nama_kompetensi": "Analisis Data",
            "tahun": "2024",
            "nilai": "88.5",
            "status": "Tercapai",
            "kode": "HC-01"
        }))
        .expect("hard row");
        assert_eq!(row.tahun, Some(2024));
        assert_eq!(row.score, Some(88.5));
        assert_eq!(row.status, Some(AchievementStatus::Achieved));
        assert_eq!(row.extra.get("kode"), Some(&json!("HC-01")));
        let out = serde_json::to_value(&row).expect("serialize");
        assert_eq!(out["name"], "Analisis Data");
        assert_eq!(out["kode"], "HC-01");
    }

    #[test]
    fn unknown_status_is_a_schema_error() {
        let r: Result<HardCompetency, _> = serde_json::from_value(json!({
            "id": 1, "nama": "X", "status": "mungkin"
        }));
        assert!(r.is_err());
    }

    #[test]
    fn page_numbers_from_meta_or_top_level() {
        let top: Paginated<MasterItem> = serde_json::from_value(json!({
            "data": [{"id": 1, "nama": "Unit A"}],
            "current_page": 2, "last_page": 5, "per_page": "1", "total": 5
        }))
        .expect("page");
        let info = top.page_info();
        assert_eq!((info.current_page, info.last_page, info.total), (2, 5, 5));

        let meta: Paginated<MasterItem> = serde_json::from_value(json!({
            "data": [],
            "meta": {"current_page": 1, "last_page": 1, "per_page": 10, "total": 0}
        }))
        .expect("page");
        assert_eq!(meta.page_info().last_page, 1);
    }

    #[test]
    fn import_report_keeps_body_and_counts() {
        let body = json!({"message": "Sebagian gagal", "sukses": 5, "gagal": 2, "detail": [1]});
        let r = ImportReport::from_body(422, body.clone());
        assert_eq!(r.outcome, ImportOutcome::Partial);
        assert_eq!((r.sukses, r.gagal), (5, 2));
        assert_eq!(r.body, body);
    }

    #[test]
    fn import_report_tolerates_any_422_body() {
        let rows = json!({"message": "Sebagian gagal", "sukses": 5, "gagal": [{"baris": 3}]});
        let r = ImportReport::from_body(422, rows.clone());
        assert_eq!(r.outcome, ImportOutcome::Partial);
        assert_eq!((r.sukses, r.gagal), (5, 1));
        assert_eq!(r.body, rows);

        let empty = ImportReport::from_body(422, Value::Null);
        assert_eq!(empty.outcome, ImportOutcome::Partial);
        assert_eq!((empty.sukses, empty.gagal), (0, 0));
        assert!(empty.message.is_none());
        assert_eq!(empty.body, Value::Null);

        let odd = ImportReport::from_body(422, json!({"sukses": "banyak", "gagal": {"n": 2}}));
        assert_eq!((odd.sukses, odd.gagal), (0, 0));
    }

    #[test]
    fn employee_input_validation() {
        let mut input = EmployeeInput {
            nik: Some("3201".into()),
            nama: Some("Budi".into()),
            ..Default::default()
        };
        assert!(input.validate(true).is_ok());
        input.nik = Some("32A1".into());
        assert!(input.validate(true).is_err());
        let update = EmployeeInput {
            email: Some("budi.example.com".into()),
            ..Default::default()
        };
        assert!(update.validate(false).is_err());
        assert_eq!(
            serde_json::to_value(EmployeeInput {
                unit_id: Some("4".into()),
                ..Default::default()
            })
            .expect("serialize"),
            json!({"unit_id": "4"})
        );
    }
}
