//! Spoken-command parsing.
//!
//! The speech recognizer is an external subprocess that prints one line
//! of text per recognized utterance. A line is a command only when it
//! contains both a known keyword and the recognizer's own
//! "recognition succeeded" marker; keyword matches in lines without
//! the marker (e.g. partial or rejected recognitions) are ignored.
//!
//! # Example
//!
//! ```rust
//! use trackbot::speech::parse_command;
//!
//! assert_eq!(parse_command("识别成功: 锤子"), Some("hammer"));
//! assert_eq!(parse_command("锤子"), None); // no success marker
//! assert_eq!(parse_command("识别成功: 苹果"), None); // unknown keyword
//! ```

/// Marker the recognizer emits on a successful recognition.
pub const RECOGNITION_MARKER: &str = "识别成功";

/// Spoken keyword to detection-label table.
pub const KEYWORD_TABLE: &[(&str, &str)] = &[
    ("扳手", "wrench"),
    ("锤子", "hammer"),
    ("锉刀", "file"),
    ("卷尺", "tape_measure"),
    ("万用表", "multimeter"),
    ("钳子", "pliers"),
    ("螺丝刀", "screwdrivers"),
    ("护目镜", "safety_goggles"),
    ("塞尺", "feeler_gauge"),
    ("游标卡尺", "vernier_caliper"),
];

/// Parse one recognizer output line into a target label.
///
/// Returns the detection label for the first table keyword found in the
/// line, but only when the recognition-succeeded marker co-occurs.
pub fn parse_command(line: &str) -> Option<&'static str> {
    if !line.contains(RECOGNITION_MARKER) {
        return None;
    }
    for (keyword, label) in KEYWORD_TABLE {
        if line.contains(keyword) {
            return Some(*label);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_with_marker_parses() {
        assert_eq!(parse_command("识别成功：扳手"), Some("wrench"));
        assert_eq!(parse_command("结果: 游标卡尺 识别成功"), Some("vernier_caliper"));
    }

    #[test]
    fn keyword_without_marker_is_ignored() {
        assert_eq!(parse_command("扳手"), None);
        assert_eq!(parse_command("正在识别 锤子"), None);
    }

    #[test]
    fn marker_without_keyword_is_ignored() {
        assert_eq!(parse_command("识别成功"), None);
        assert_eq!(parse_command("识别成功: 香蕉"), None);
    }

    #[test]
    fn empty_line() {
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn every_table_entry_round_trips() {
        for (keyword, label) in KEYWORD_TABLE {
            let line = format!("{RECOGNITION_MARKER}: {keyword}");
            assert_eq!(parse_command(&line), Some(*label));
        }
    }
}
