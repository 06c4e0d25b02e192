//! Test-only helpers.

/// Number of property-test cases to run.
///
/// `PROPTEST_CASES` overrides everything; CI runs the module's default;
/// local runs are clamped down so `cargo test` stays fast.
pub fn proptest_cases(default: u32) -> u32 {
    if let Some(value) = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
    {
        return value.max(1);
    }
    if std::env::var_os("CI").is_some() {
        default.max(1)
    } else {
        default.clamp(1, 8)
    }
}
