//! Rendering of service replies.

use clap::ValueEnum;
use walkgraph_service_shared::{ProblemDetails, Response};

use crate::terminal::{format_with_separators, ColorPalette};

/// How replies are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// The reply exactly as received, one JSON object per line.
    Json,
}

/// Render one reply. Problems render too; callers decide the exit status.
pub fn render(response: &Response, format: OutputFormat, palette: &ColorPalette) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(response).unwrap_or_else(|e| format!("{{\"render_error\":\"{e}\"}}"))
        }
        OutputFormat::Text => render_text(response, palette),
    }
}

fn render_text(response: &Response, p: &ColorPalette) -> String {
    if let Some(problem) = &response.problem {
        return render_problem(problem, p);
    }

    if let Some(walk) = &response.walk {
        return format!(
            "{ok}recorded{reset} {v}{}{reset} edges ({} new, {} new places)",
            walk.edges_recorded,
            walk.new_edges,
            walk.nodes_created,
            ok = p.ok,
            v = p.value,
            reset = p.reset,
        );
    }
    if let Some(length) = response.shortest_path_length {
        return format!(
            "{gray}shortest path:{reset} {v}{}{reset}",
            format_with_separators(length),
            gray = p.gray,
            v = p.value,
            reset = p.reset,
        );
    }
    if let Some(total) = response.total_length {
        return format!(
            "{gray}total length:{reset} {v}{}{reset}",
            format_with_separators(total),
            gray = p.gray,
            v = p.value,
            reset = p.reset,
        );
    }
    if let Some(stats) = &response.stats {
        return format!(
            "{gray}places:{reset} {v}{}{reset}  {gray}edges:{reset} {v}{}{reset}  {gray}observations:{reset} {v}{}{reset}",
            format_with_separators(stats.nodes as u64),
            format_with_separators(stats.edges as u64),
            format_with_separators(stats.observations),
            gray = p.gray,
            v = p.value,
            reset = p.reset,
        );
    }

    format!("{}ok{}", p.ok, p.reset)
}

fn render_problem(problem: &ProblemDetails, p: &ColorPalette) -> String {
    let mut out = format!("{}error{}: {}", p.error, p.reset, problem.title);
    if let Some(detail) = &problem.detail {
        out.push_str(": ");
        out.push_str(detail);
    }
    if problem.retryable {
        out.push_str(" (retryable)");
    }
    if let Some(instance) = &problem.instance {
        out.push_str(&format!(" {}[{}]{}", p.gray, instance, p.reset));
    }
    out
}
