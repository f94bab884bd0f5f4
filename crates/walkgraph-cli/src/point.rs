//! Parsing of `x,y` command-line points.

use walkgraph_lib::Location;

/// Parse `"x,y"` into a location. Whitespace around either number is allowed.
///
/// Used as a clap `value_parser`, hence the `String` error.
///
/// ```
/// # use walkgraph_cli::point::parse_point;
/// let p = parse_point("12.5, -3").unwrap();
/// assert_eq!((p.x, p.y), (12.5, -3.0));
/// assert!(parse_point("12.5").is_err());
/// ```
pub fn parse_point(s: &str) -> Result<Location, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
    let x = parse_coordinate(x, "x")?;
    let y = parse_coordinate(y, "y")?;
    Ok(Location::new(x, y))
}

fn parse_coordinate(raw: &str, axis: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{axis} coordinate '{}' is not a number", raw.trim()))?;
    if !value.is_finite() {
        return Err(format!("{axis} coordinate must be finite"));
    }
    Ok(value)
}
