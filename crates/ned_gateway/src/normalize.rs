//! Repairs for the gateway's known broken markup.
//!
//! These are workarounds for one specific server, not a general HTML
//! sanitizer. They must be applied before every parse, identically on every
//! pass; the scanner itself never sees the raw bytes.

/// Fix-up needed on every gateway response: a stray `;=` sequence inside
/// attribute values.
pub fn normalize(html: &str) -> String {
    html.replace("false;=", "false=")
}

/// The session-replay response additionally ships `onclick` values without
/// opening quotes, so quote them in and close them at the script tail.
pub fn normalize_replay(html: &str) -> String {
    normalize(html)
        .replace("onclick=", "onclick=\"")
        .replace("false;>", "false;\">")
}
