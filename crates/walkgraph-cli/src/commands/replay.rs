//! `replay` subcommand: send a JSON Lines file of requests in order.
//!
//! Each non-blank line is one request exactly as it appears on the wire,
//! e.g. `{"one_to_one":{"origin":{"x":0,"y":0},"destination":{"x":3,"y":4}}}`.
//! Lines starting with `#` are comments. `-` reads from stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use walkgraph_service_shared::Request;

use super::Session;

/// A request together with the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub request: Request,
}

/// Parse every request in `reader`. The first malformed line aborts.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<ScriptLine>> {
    let mut script = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("failed to read line {number}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let request = serde_json::from_str(trimmed)
            .with_context(|| format!("line {number} is not a valid request"))?;
        script.push(ScriptLine {
            line: number,
            request,
        });
    }
    Ok(script)
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Replay the script at `path`. Returns whether every reply succeeded.
pub async fn handle_replay(session: &mut Session, path: &Path, stop_on_error: bool) -> Result<bool> {
    let script = parse_script(open(path)?)?;

    let mut failed = 0usize;
    for entry in &script {
        let ok = session
            .execute(&entry.request)
            .await
            .with_context(|| format!("line {}", entry.line))?;
        if !ok {
            failed += 1;
            if stop_on_error {
                eprintln!("stopping at line {}", entry.line);
                break;
            }
        }
    }

    info!(requests = script.len(), failed, "replay finished");
    Ok(failed == 0)
}
