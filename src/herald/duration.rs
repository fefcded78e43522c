use crate::herald::warn::{self, WarnEvent};
use regex::Regex;
use std::sync::OnceLock;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern")
    })
}

/// Convert a YouTube `contentDetails.duration` string (`P0D` or
/// `PT[nH][nM][nS]`) to a zero-padded `HH:MM:SS` display form.
///
/// Unparseable input yields `00:00:00` rather than failing the run; a warn
/// event makes the anomaly visible.
pub fn format_duration(raw: &str) -> String {
    if raw == "P0D" {
        return "00:00:00".to_string();
    }

    let (hours, minutes, seconds) = match duration_pattern().captures(raw) {
        Some(caps) => (
            capture_num(&caps, 1),
            capture_num(&caps, 2),
            capture_num(&caps, 3),
        ),
        None => {
            warn::emit(WarnEvent {
                code: "DURATION_UNPARSED",
                stage: "duration-codec",
                channel: "na",
                video: "na",
                reason: raw,
                err: "no-components-matched",
            });
            (0, 0, 0)
        }
    };

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn capture_num(caps: &regex::Captures<'_>, idx: usize) -> u64 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}
