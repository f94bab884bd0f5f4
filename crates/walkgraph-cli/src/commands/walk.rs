//! `walk` subcommand: record one walk.

use anyhow::{bail, Result};
use walkgraph_lib::Location;
use walkgraph_service_shared::{Request, WalkRequest};

use super::Session;

/// Reject walks the service would refuse for their shape alone.
pub fn check_legs(points: &[Location], lengths: &[u32]) -> Result<()> {
    if points.len() < 2 {
        bail!("a walk needs at least two --point values, got {}", points.len());
    }
    if lengths.len() != points.len() - 1 {
        bail!(
            "{} points need {} --length values, got {}",
            points.len(),
            points.len() - 1,
            lengths.len()
        );
    }
    Ok(())
}

/// Record a walk through `points` with one length per leg.
pub async fn handle_walk(session: &mut Session, points: Vec<Location>, lengths: Vec<u32>) -> Result<bool> {
    let request = Request::Walk(WalkRequest {
        locations: points,
        lengths,
    });
    session.execute(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: u32) -> Vec<Location> {
        (0..n).map(|i| Location::new(f64::from(i) * 1000.0, 0.0)).collect()
    }

    #[test]
    fn test_check_legs() {
        assert!(check_legs(&points(3), &[1, 2]).is_ok());
        assert!(check_legs(&points(1), &[]).is_err());
        let error = check_legs(&points(3), &[1]).unwrap_err();
        assert_eq!(error.to_string(), "3 points need 2 --length values, got 1");
    }
}
