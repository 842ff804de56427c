use crate::api::{HardCompetency, SoftCompetency};
use crate::calc::{self, CompetencyKind, CompetencyRow, THRESHOLDS};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    client_failure, require_session, str_param, u32_param, year_param,
};
use crate::ipc::types::{AppState, Request};
use crate::paging;
use serde::Serialize;
use serde_json::{json, Value};

/// Serializes a row and tags it with its score band (`null` when unscored).
pub fn banded<T: Serialize>(item: &T, score: Option<f64>) -> Value {
    let mut v = serde_json::to_value(item).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut v {
        let band = score.filter(|s| s.is_finite()).map(calc::compute_band);
        map.insert("band".to_string(), json!(band));
    }
    v
}

pub fn hard_rows_json(rows: &[HardCompetency]) -> Vec<Value> {
    rows.iter().map(|r| banded(r, r.score)).collect()
}

pub fn soft_rows_json(rows: &[SoftCompetency]) -> Vec<Value> {
    rows.iter().map(|r| banded(r, r.score)).collect()
}

fn summary_json(kind: CompetencyKind, rows: &[CompetencyRow]) -> Value {
    json!(calc::summarize(kind, rows))
}

fn handle_hard_list(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tahun = match year_param(req, "tahun") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (page, per_page) = match (u32_param(req, "page"), u32_param(req, "perPage")) {
        (Ok(p), Ok(pp)) => (p, pp),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let rows = match state.client.own_hard_competencies(&mut state.session, tahun) {
        Ok(rows) => rows,
        Err(e) => return client_failure(state, req, e),
    };
    let all: Vec<CompetencyRow> = rows.iter().map(HardCompetency::to_row).collect();
    let summary = summary_json(CompetencyKind::Hard, &all);

    let filtered: Vec<HardCompetency> = match str_param(req, "search") {
        Some(q) => rows
            .into_iter()
            .filter(|r| paging::matches_filter(q, &[r.name.as_str()]))
            .collect(),
        None => rows,
    };
    let mut result = json!({
        "tahun": tahun,
        "summary": summary,
        "thresholds": THRESHOLDS,
    });
    if page.is_some() || per_page.is_some() {
        let (slice, info) = paging::paginate(
            &filtered,
            paging::clamp_page(page),
            paging::clamp_per_page(per_page),
        );
        result["rows"] = json!(hard_rows_json(&slice));
        result["pagination"] = json!(info);
    } else {
        result["rows"] = json!(hard_rows_json(&filtered));
    }
    result["matched"] = json!(filtered.len());
    ok(&req.id, result)
}

fn handle_soft_list(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tahun = match year_param(req, "tahun") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let rows = match state.client.own_soft_competencies(&mut state.session, tahun) {
        Ok(rows) => rows,
        Err(e) => return client_failure(state, req, e),
    };
    let all: Vec<CompetencyRow> = rows.iter().map(SoftCompetency::to_row).collect();
    let result = json!({
        "tahun": tahun,
        "rows": soft_rows_json(&rows),
        "summary": summary_json(CompetencyKind::Soft, &all),
        "thresholds": THRESHOLDS,
    });
    ok(&req.id, result)
}

fn handle_profile(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    match state.client.own_profile(&mut state.session) {
        Ok(profile) => {
            ok(&req.id, json!({ "profile": profile }))
        }
        Err(e) => client_failure(state, req, e),
    }
}

/// Both summaries for the dashboard home cards.
fn handle_summary(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = require_session(state, req) {
        return resp;
    }
    let tahun = match year_param(req, "tahun") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let hard = match state.client.own_hard_competencies(&mut state.session, tahun) {
        Ok(rows) => rows,
        Err(e) => return client_failure(state, req, e),
    };
    let soft = match state.client.own_soft_competencies(&mut state.session, tahun) {
        Ok(rows) => rows,
        Err(e) => return client_failure(state, req, e),
    };
    let hard_rows: Vec<CompetencyRow> = hard.iter().map(HardCompetency::to_row).collect();
    let soft_rows: Vec<CompetencyRow> = soft.iter().map(SoftCompetency::to_row).collect();
    let result = json!({
        "tahun": tahun,
        "hard": summary_json(CompetencyKind::Hard, &hard_rows),
        "soft": summary_json(CompetencyKind::Soft, &soft_rows),
        "thresholds": THRESHOLDS,
    });
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "karyawan.hard.list" => Some(handle_hard_list(state, req)),
        "karyawan.soft.list" => Some(handle_soft_list(state, req)),
        "karyawan.profile" => Some(handle_profile(state, req)),
        "karyawan.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
