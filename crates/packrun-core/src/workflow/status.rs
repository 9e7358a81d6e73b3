//! Remote run status classification.
//!
//! Backend status vocabularies drift between releases ("Completed",
//! "succeeded", "timed-out", ...). An explicit allow-list over a normalized
//! form decides when polling can stop, and anything unrecognized stays
//! non-terminal so polling continues bounded only by the caller's timeout.

/// Classification of one raw status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusClass {
    pub terminal: bool,
    pub failed: bool,
}

const TERMINAL: &[&str] = &[
    "completed",
    "complete",
    "success",
    "succeeded",
    "failed",
    "error",
    "cancelled",
    "canceled",
    "timed_out",
    "timeout",
];

const FAILED: &[&str] = &[
    "failed",
    "error",
    "cancelled",
    "canceled",
    "timed_out",
    "timeout",
];

/// Classify a raw remote status string.
pub fn classify(raw: &str) -> StatusClass {
    let normalized = normalize(raw);
    StatusClass {
        terminal: TERMINAL.contains(&normalized.as_str()),
        failed: FAILED.contains(&normalized.as_str()),
    }
}

/// Lowercase; whitespace and hyphens become underscores, runs collapsed.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
