//! Log-based encode progress estimation.
//!
//! The encoder's stderr is redirected to a plaintext log; progress is
//! estimated from the most recent `time=HH:MM:SS.cc` token near the end of
//! that log, against the expected total output duration.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Trailer the encoder writes only after muxing fully finishes.
pub const COMPLETION_MARKER: &str = "muxing overhead:";

/// Reported while the log is still missing or empty.
const FLOOR_STARTING: u8 = 5;
/// Reported when the log has content but no time token yet (initializing).
const FLOOR_INITIALIZING: u8 = 8;
/// Lines scanned backwards from the end of the log.
const SCAN_LINES: usize = 50;
/// Bytes of log kept as failure diagnostics.
const TAIL_BYTES: usize = 2000;

fn time_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"time=(\d+):(\d+):(\d+)\.(\d+)").expect("valid regex"))
}

/// Estimate encode progress as 0..=99.
///
/// Never returns 100: completion is only confirmed by the job runner after
/// the marker and output-file checks, so a full-looking log must not produce
/// a false-complete signal.
pub fn estimate_progress(log_path: &Path, expected_duration_secs: f64) -> u8 {
    let Ok(content) = std::fs::read_to_string(log_path) else {
        return FLOOR_STARTING;
    };
    if content.is_empty() {
        return FLOOR_STARTING;
    }

    let Some(current) = latest_encoded_secs(&content) else {
        return FLOOR_INITIALIZING;
    };

    if expected_duration_secs > 0.0 && current > 0 {
        let percent = (current as f64 / expected_duration_secs * 100.0) as u8;
        return percent.min(99);
    }
    FLOOR_INITIALIZING
}

/// Most recent encoded position in seconds, scanning the last lines backward.
pub fn latest_encoded_secs(log_content: &str) -> Option<u64> {
    let lines: Vec<&str> = log_content.lines().collect();
    let start = lines.len().saturating_sub(SCAN_LINES);
    for line in lines[start..].iter().rev() {
        if let Some(caps) = time_token().captures(line) {
            let hours: u64 = caps[1].parse().ok()?;
            let minutes: u64 = caps[2].parse().ok()?;
            let seconds: u64 = caps[3].parse().ok()?;
            return Some(hours * 3600 + minutes * 60 + seconds);
        }
    }
    None
}

/// Check the log for the completion trailer.
pub fn has_completion_marker(log_path: &Path, marker: &str) -> bool {
    std::fs::read_to_string(log_path)
        .map(|content| content.contains(marker))
        .unwrap_or(false)
}

/// Last portion of the log, kept for failure diagnostics.
pub fn log_tail(log_path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(log_path) else {
        return String::new();
    };
    // Avoid splitting a UTF-8 sequence.
    let mut start = content.len().saturating_sub(TAIL_BYTES);
    while !content.is_char_boundary(start) {
        start += 1;
    }
    content[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn log_with(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encode.log");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_log_is_starting() {
        assert_eq!(
            estimate_progress(Path::new("/nonexistent/encode.log"), 51.0),
            5
        );
    }

    #[test]
    fn test_empty_log_is_starting() {
        let (_dir, path) = log_with("");
        assert_eq!(estimate_progress(&path, 51.0), 5);
    }

    #[test]
    fn test_log_without_time_token_is_initializing() {
        let (_dir, path) = log_with("ffmpeg version 6.0\nStream mapping:\n");
        assert_eq!(estimate_progress(&path, 51.0), 8);
    }

    #[test]
    fn test_latest_time_token_wins() {
        let (_dir, path) = log_with(
            "frame= 100 time=00:00:10.00 bitrate=900kbits/s\n\
             frame= 200 time=00:00:25.50 bitrate=900kbits/s\n",
        );
        // 25 of 51 seconds
        assert_eq!(estimate_progress(&path, 51.0), 49);
    }

    #[test]
    fn test_never_reports_100() {
        let (_dir, path) = log_with("frame= 999 time=00:01:40.00 bitrate=900kbits/s\n");
        assert_eq!(estimate_progress(&path, 51.0), 99);
    }

    #[test]
    fn test_hours_and_minutes_convert() {
        assert_eq!(
            latest_encoded_secs("time=01:02:03.45 bitrate=1k"),
            Some(3723)
        );
    }

    #[test]
    fn test_completion_marker() {
        let (_dir, path) = log_with("video:1000kB muxing overhead: 0.5%\n");
        assert!(has_completion_marker(&path, COMPLETION_MARKER));
        let (_dir2, path2) = log_with("still encoding\n");
        assert!(!has_completion_marker(&path2, COMPLETION_MARKER));
    }

    #[test]
    fn test_log_tail_limits_size() {
        let (_dir, path) = log_with(&"x".repeat(5000));
        assert_eq!(log_tail(&path).len(), 2000);
    }
}
