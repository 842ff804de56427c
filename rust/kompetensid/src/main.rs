mod api;
mod calc;
mod config;
mod db;
mod guard;
mod ipc;
mod lenient;
mod logging;
mod paging;
mod session;

use log::{error, info, warn};
use serde_json::json;
use std::io::{self, BufRead, Write};

fn main() {
    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("kompetensid: invalid configuration: {e:#}");
            std::process::exit(2);
        }
    };
    if let Err(e) = logging::init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("kompetensid: {e}");
    }

    let client = match api::ApiClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("event=http_client_init status=error detail={e:#}");
            eprintln!("kompetensid: cannot build http client: {e:#}");
            std::process::exit(2);
        }
    };
    let workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config, client);
    if let Some(path) = workspace {
        // The UI can still pick a workspace later.
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            warn!("event=workspace_open status=error detail={e:#}");
        }
    }
    info!("event=ipc_ready api_base_url={}", state.client.base_url());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                warn!("event=ipc_bad_json detail={e}");
                let resp = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("event=ipc_closed");
}
