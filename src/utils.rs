use colored::Colorize;

/// Canonical literal text for a number: always at least one fractional digit.
pub fn number_literal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Text printed for a number value at runtime: integral values drop the fraction.
pub fn number_display(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Writes a diagnostic line to stderr, red when colors are enabled.
pub fn report(message: &str) {
    eprintln!("{}", message.red());
}
