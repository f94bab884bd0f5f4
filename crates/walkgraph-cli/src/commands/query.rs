//! `shortest` and `total` subcommands.

use anyhow::Result;
use walkgraph_lib::Location;
use walkgraph_service_shared::{OneToAllRequest, OneToOneRequest, Request};

use super::Session;

pub async fn handle_shortest(session: &mut Session, from: Location, to: Location) -> Result<bool> {
    let request = Request::OneToOne(OneToOneRequest {
        origin: from,
        destination: to,
    });
    session.execute(&request).await
}

pub async fn handle_total(session: &mut Session, from: Location) -> Result<bool> {
    let request = Request::OneToAll(OneToAllRequest { origin: from });
    session.execute(&request).await
}
