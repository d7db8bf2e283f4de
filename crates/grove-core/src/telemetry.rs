// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

// Telemetry helpers for JSONL logging when the `telemetry` feature is enabled.
// Manually formats JSON to avoid non-deterministic serde_json dependency.

fn ts_micros() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros()
}

/// Emits a telemetry event for one applied or rejected change.
///
/// Logs the change kind and its classification as a JSON line to stdout.
/// Best-effort: I/O errors are ignored and timestamps fall back to 0 on
/// clock errors.
pub fn change(kind: &str, result: &str) {
    use std::io::Write as _;
    // Manually format JSON to avoid serde_json dependency
    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        r#"{{"timestamp_micros":{},"event":"change","kind":"{}","result":"{}"}}"#,
        ts_micros(),
        kind,
        result
    );
    let _ = out.write_all(b"\n");
}

/// Emits a telemetry event when a transaction closes.
///
/// Logs the final classification and the number of detached sequences still
/// pending (non-zero only for malformed closes) as a JSON line to stdout.
/// Best-effort: I/O errors are ignored and timestamps fall back to 0 on
/// clock errors.
pub fn closed(result: &str, pending: usize) {
    use std::io::Write as _;
    // Manually format JSON to avoid serde_json dependency
    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        r#"{{"timestamp_micros":{},"event":"closed","result":"{}","pending_sequences":{}}}"#,
        ts_micros(),
        result,
        pending
    );
    let _ = out.write_all(b"\n");
}
