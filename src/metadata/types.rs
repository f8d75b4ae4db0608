use serde::{Deserialize, Serialize};

/// Resolved metadata for a video url. A result only exists when a title was
/// found; thumbnail and duration are best-effort extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
}

/// Render a duration in seconds the way players display it: `m:ss`, or
/// `h:mm:ss` past the hour mark.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
