//! Terminal styling for text output.

/// ANSI escape codes.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    /// Bold green for successful replies.
    pub const OK: &str = "\x1b[1;32m";
    /// Bold red for problem titles.
    pub const ERROR: &str = "\x1b[1;31m";
    /// Bright bold white for lengths and counts.
    pub const VALUE: &str = "\x1b[1;97m";
    /// Gray for labels and request ids.
    pub const GRAY: &str = "\x1b[90m";
}

/// Resolved color codes, or empty strings when color is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub ok: &'static str,
    pub error: &'static str,
    pub value: &'static str,
    pub gray: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            ok: colors::OK,
            error: colors::ERROR,
            value: colors::VALUE,
            gray: colors::GRAY,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            ok: "",
            error: "",
            value: "",
            gray: "",
        }
    }

    /// `colored()` unless the environment asks for plain output.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Whether ANSI colors should be used, honouring `NO_COLOR`
/// (<https://no-color.org/>) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    color_allowed(|key| std::env::var(key).ok())
}

fn color_allowed(lookup: impl Fn(&str) -> Option<String>) -> bool {
    if lookup("NO_COLOR").is_some() {
        return false;
    }
    !lookup("TERM").is_some_and(|term| term.eq_ignore_ascii_case("dumb"))
}

/// Format a number with thousand separators.
///
/// ```
/// # use walkgraph_cli::terminal::format_with_separators;
/// assert_eq!(format_with_separators(999), "999");
/// assert_eq!(format_with_separators(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_with_separators(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
