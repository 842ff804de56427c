use crate::calc::{self, CompetencyRow, THRESHOLDS};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::kind_param;
use crate::ipc::types::{AppState, Request};
use crate::lenient;
use serde_json::json;

fn handle_band(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let score = req
        .params
        .get("score")
        .and_then(lenient::number_from_value)
        .filter(|s| s.is_finite());
    let Some(score) = score else {
        return err(&req.id, "bad_params", "params.score must be a number", None);
    };
    ok(
        &req.id,
        json!({
            "score": score,
            "band": calc::compute_band(score),
            "thresholds": THRESHOLDS,
        }),
    )
}

fn handle_achievement(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match kind_param(req, "kind") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let rows: Vec<CompetencyRow> = match req.params.get("rows") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(rows) => rows,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("params.rows: {e}"),
                    None,
                )
            }
        },
    };
    ok(
        &req.id,
        json!({
            "kind": kind,
            "summary": calc::summarize(kind, &rows),
            "thresholds": THRESHOLDS,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.band" => Some(handle_band(state, req)),
        "stats.achievement" => Some(handle_achievement(state, req)),
        _ => None,
    }
}
