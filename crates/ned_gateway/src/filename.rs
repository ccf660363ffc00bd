use sha2::{Digest, Sha256};
use url::Url;

/// Windows-safe archive name derived from a candidate's display name.
/// `None` when the name sanitizes down to nothing.
pub fn candidate_filename(name: &str) -> Option<String> {
    let cleaned = sanitize(name);
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("{cleaned}.zip"))
    }
}

/// Fallback naming for unnamed candidates: the signed URL's trailing path
/// segment, or a short hash of the whole URL when the path yields nothing.
pub fn signed_url_filename(url: &str) -> String {
    let trailing = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(sanitize)
    });
    match trailing.filter(|segment| !segment.is_empty()) {
        Some(mut segment) => {
            if !segment.to_ascii_lowercase().ends_with(".zip") {
                segment.push_str(".zip");
            }
            segment
        }
        None => format!("{}.zip", short_hash(url)),
    }
}

fn sanitize(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.trim().chars() {
        let mapped = if is_forbidden(c) { '_' } else { c };
        if mapped == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        cleaned.push(mapped);
    }
    let mut cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.len() > 80 {
        let mut end = 80;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
