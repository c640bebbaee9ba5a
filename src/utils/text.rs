//! Text helpers.

/// Interpret a loose truthy string: `true`, `1`, `t`, `y`, or `yes`,
/// ignoring case and surrounding whitespace. Anything else is false.
pub fn str_to_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "t" | "y" | "yes"
    )
}
