// Host header values arrive in whatever shape the client sent them:
// mixed case, stray whitespace, an optional port suffix. Every comparison
// against catalog rows or token targets goes through this normal form.

/// Lowercases, trims, and strips a `:port` suffix from a host value.
///
/// Returns an empty string for inputs with nothing left after trimming,
/// which callers treat the same as a missing host.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().to_ascii_lowercase();
    match trimmed.split_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host.to_string(),
        _ => trimmed,
    }
}
