//! ID generation utilities for Ready4Uni
//!
//! Session ids and per-message tool call ids.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Generate a unique session ID
///
/// Format: `{timestamp_ms}-{random_hex}`
/// Example: `1738300800123-a1b2`
pub fn generate_session_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("{}-{:04x}", timestamp, random)
}

/// Generate an ID for the nth tool call made while answering one message
///
/// Format: `call-{session_suffix}-{index:03}`
/// Example: For session "1738300800123-a1b2" and index 2: "call-a1b2-002"
pub fn generate_call_id(session_id: &str, index: usize) -> String {
    let suffix = session_id.rsplit('-').next().unwrap_or(session_id);
    format!("call-{}-{:03}", suffix, index)
}
