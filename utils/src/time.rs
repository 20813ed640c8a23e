//! Duration formatting for logs and CLI output.

use std::time::Duration;

/// Format a number of seconds compactly, keeping the two most significant units.
pub fn format_secs(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        3600..=86399 => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d {}h", secs / 86400, (secs % 86400) / 3600),
    }
}

/// Like [`format_secs`], with millisecond precision below one second.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format_secs(duration.as_secs())
    }
}
