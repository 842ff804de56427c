use super::karyawan::{hard_rows_json, soft_rows_json};
use crate::api::{
    EmployeeInput, EmployeeQuery, HardCompetency, ImportOutcome, ImportUpload, SoftCompetency,
};
use crate::calc::{self, CompetencyKind, CompetencyRow, THRESHOLDS};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    client_failure, current_year, id_param, kind_param, require_admin, required_str, str_param,
    u32_param, year_param,
};
use crate::ipc::types::{AppState, Request};
use crate::paging;
use log::{info, warn};
use serde_json::{json, Value};
use std::path::Path;

pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";
const CSV_MIME: &str = "text/csv";

/// Spreadsheet types the import endpoint accepts, by extension.
fn import_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" => Some(XLSX_MIME),
        "xls" => Some(XLS_MIME),
        "csv" => Some(CSV_MIME),
        _ => None,
    }
}

fn employee_input(req: &Request) -> Result<EmployeeInput, Value> {
    let raw = req
        .params
        .get("employee")
        .cloned()
        .unwrap_or_else(|| json!({}));
    serde_json::from_value(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("params.employee: {e}"),
            None,
        )
    })
}

fn handle_employees_list(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let (page, per_page) = match (u32_param(req, "page"), u32_param(req, "perPage")) {
        (Ok(p), Ok(pp)) => (p, pp),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let mut query = EmployeeQuery {
        page: paging::clamp_page(page),
        per_page: paging::clamp_per_page(per_page),
        search: str_param(req, "search").map(str::to_string),
    };
    let mut listing = match state.client.employees(&mut state.session, &query) {
        Ok(p) => p,
        Err(e) => return client_failure(state, req, e),
    };
    // A deletion or a narrower search can leave the requested page past the end.
    let reported_last = listing
        .meta
        .as_ref()
        .unwrap_or(&listing.top)
        .last_page
        .unwrap_or(1)
        .max(1) as u32;
    if listing.data.is_empty() && query.page > reported_last {
        query.page = reported_last;
        listing = match state.client.employees(&mut state.session, &query) {
            Ok(p) => p,
            Err(e) => return client_failure(state, req, e),
        };
    }
    let pagination = listing.page_info();
    let result = json!({
        "rows": listing.data,
        "pagination": pagination,
        "search": query.search,
    });
    ok(&req.id, result)
}

fn handle_employee_get(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let nik = match id_param(req, "nik") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.client.employee(&mut state.session, &nik) {
        Ok(employee) => ok(&req.id, json!({ "employee": employee })),
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_employee_create(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let input = match employee_input(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.client.create_employee(&mut state.session, &input) {
        Ok(employee) => ok(&req.id, json!({ "employee": employee })),
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_employee_update(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let nik = match id_param(req, "nik") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match employee_input(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.client.update_employee(&mut state.session, &nik, &input) {
        Ok(employee) => ok(&req.id, json!({ "employee": employee })),
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_employee_delete(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let nik = match id_param(req, "nik") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.client.delete_employee(&mut state.session, &nik) {
        Ok(message) => ok(&req.id, json!({ "deleted": true, "message": message })),
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_employee_competencies(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let nik = match id_param(req, "nik") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let kind = match kind_param(req, "jenis") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let tahun = match year_param(req, "tahun") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let fetched = match kind {
        CompetencyKind::Hard => state
            .client
            .employee_hard_competencies(&mut state.session, &nik, tahun)
            .map(|rows| {
                let all: Vec<CompetencyRow> = rows.iter().map(HardCompetency::to_row).collect();
                (hard_rows_json(&rows), all)
            }),
        CompetencyKind::Soft => state
            .client
            .employee_soft_competencies(&mut state.session, &nik, tahun)
            .map(|rows| {
                let all: Vec<CompetencyRow> = rows.iter().map(SoftCompetency::to_row).collect();
                (soft_rows_json(&rows), all)
            }),
    };
    let (rows, all) = match fetched {
        Ok(v) => v,
        Err(e) => return client_failure(state, req, e),
    };
    let result = json!({
        "nik": nik,
        "jenis": kind,
        "tahun": tahun,
        "rows": rows,
        "summary": calc::summarize(kind, &all),
        "thresholds": THRESHOLDS,
    });
    ok(&req.id, result)
}

/// Reads and checks the spreadsheet before anything is sent.
fn read_import_file(req: &Request, path: &Path) -> Result<(String, &'static str, Vec<u8>), Value> {
    let Some(mime) = import_mime(path) else {
        return Err(err(
            &req.id,
            "bad_params",
            "File harus berformat .xlsx, .xls atau .csv.",
            Some(json!({ "path": path.to_string_lossy() })),
        ));
    };
    let meta = std::fs::metadata(path).map_err(|e| {
        err(
            &req.id,
            "io_failed",
            format!("cannot read {}: {e}", path.display()),
            None,
        )
    })?;
    if !meta.is_file() {
        return Err(err(
            &req.id,
            "bad_params",
            format!("not a file: {}", path.display()),
            None,
        ));
    }
    if meta.len() == 0 {
        return Err(err(&req.id, "bad_params", "File kosong.", None));
    }
    if meta.len() > MAX_IMPORT_BYTES {
        return Err(err(
            &req.id,
            "bad_params",
            "Ukuran file maksimal 10 MB.",
            Some(json!({ "bytes": meta.len(), "maxBytes": MAX_IMPORT_BYTES })),
        ));
    }
    let bytes = std::fs::read(path).map_err(|e| {
        err(
            &req.id,
            "io_failed",
            format!("cannot read {}: {e}", path.display()),
            None,
        )
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "import".to_string());
    Ok((file_name, mime, bytes))
}

fn handle_import_upload(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let path = match required_str(req, "path") {
        Ok(v) => Path::new(v).to_path_buf(),
        Err(resp) => return resp,
    };
    let jenis = match kind_param(req, "jenis") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let tahun = match year_param(req, "tahun") {
        Ok(v) => v.unwrap_or_else(current_year),
        Err(resp) => return resp,
    };
    let (file_name, mime, bytes) = match read_import_file(req, &path) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let upload = ImportUpload {
        file_name,
        mime: mime.to_string(),
        bytes,
        tahun,
        jenis,
    };
    match state.client.import_competencies(&mut state.session, upload) {
        Ok(report) => {
            let partial = report.outcome == ImportOutcome::Partial;
            if partial {
                warn!(
                    "event=competency_import status=partial sukses={} gagal={}",
                    report.sukses, report.gagal
                );
            }
            let mut result = json!(report);
            result["partial"] = json!(partial);
            ok(&req.id, result)
        }
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_import_logs(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let page = match u32_param(req, "page") {
        Ok(p) => paging::clamp_page(p),
        Err(resp) => return resp,
    };
    let logs = match state.client.import_logs(&mut state.session, page) {
        Ok(v) => v,
        Err(e) => return client_failure(state, req, e),
    };
    let rows: Vec<Value> = logs
        .data
        .iter()
        .map(|log| {
            let mut v = serde_json::to_value(log).unwrap_or(Value::Null);
            if let Value::Object(map) = &mut v {
                map.insert("cancellable".to_string(), json!(log.cancellable()));
            }
            v
        })
        .collect();
    let result = json!({ "rows": rows, "pagination": logs.page_info() });
    ok(&req.id, result)
}

fn handle_import_cancel(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    let id = match id_param(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.client.cancel_import(&mut state.session, &id) {
        Ok(message) => {
            info!("event=import_cancel status=ok");
            ok(&req.id, json!({ "cancelled": true, "message": message }))
        }
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_master_units(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    match state.client.units(&mut state.session) {
        Ok(items) => ok(&req.id, json!({ "items": items })),
        Err(e) => client_failure(state, req, e),
    }
}

fn handle_master_cities(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_admin(state, req) {
        return resp;
    }
    match state.client.cities(&mut state.session) {
        Ok(items) => ok(&req.id, json!({ "items": items })),
        Err(e) => client_failure(state, req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "admin.employees.list" => Some(handle_employees_list(state, req)),
        "admin.employees.get" => Some(handle_employee_get(state, req)),
        "admin.employees.create" => Some(handle_employee_create(state, req)),
        "admin.employees.update" => Some(handle_employee_update(state, req)),
        "admin.employees.delete" => Some(handle_employee_delete(state, req)),
        "admin.employees.competencies" => Some(handle_employee_competencies(state, req)),
        "admin.import.upload" => Some(handle_import_upload(state, req)),
        "admin.import.logs" => Some(handle_import_logs(state, req)),
        "admin.import.cancel" => Some(handle_import_cancel(state, req)),
        "admin.master.units" => Some(handle_master_units(state, req)),
        "admin.master.cities" => Some(handle_master_cities(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_spreadsheets_are_importable() {
        assert_eq!(import_mime(Path::new("nilai.XLSX")), Some(XLSX_MIME));
        assert_eq!(import_mime(Path::new("/tmp/a.xls")), Some(XLS_MIME));
        assert_eq!(import_mime(Path::new("rekap.csv")), Some(CSV_MIME));
        assert_eq!(import_mime(Path::new("rekap.pdf")), None);
        assert_eq!(import_mime(Path::new("noext")), None);
    }
}
