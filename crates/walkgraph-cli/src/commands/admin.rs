//! `reset` and `stats` subcommands.

use anyhow::Result;
use walkgraph_service_shared::Request;

use super::Session;

pub async fn handle_reset(session: &mut Session) -> Result<bool> {
    session.execute(&Request::Reset).await
}

pub async fn handle_stats(session: &mut Session) -> Result<bool> {
    session.execute(&Request::Stats).await
}
