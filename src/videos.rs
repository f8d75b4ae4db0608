use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Emoji/color-coded group for videos. `name` is the human-facing key used
/// for backup portability; the store does not enforce its uniqueness.
#[derive(Debug, Clone, Eq, Default, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,

    pub name: String,
    pub emoji: String,
    pub color: String,

    /// PIN gate. UX affordance only: the pin is stored and compared in
    /// plaintext and must never be treated as an authorization boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl Hash for Category {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A saved link to a social-media video. `category_id` may reference a
/// category that no longer exists; a dangling reference means
/// "uncategorized", never an error.
#[derive(Debug, Clone, Eq, Default, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub user_id: String,

    pub title: String,
    pub thumbnail_url: String,
    pub platform: String,
    pub duration: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_favorite: bool,
    pub date_added: String,
    pub original_url: String,
}

impl Hash for Video {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Video {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoCreate {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryCreate {
    pub name: String,
    pub emoji: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    pub id: Option<String>,
    pub title: Option<String>,
    pub category_id: Option<String>,
    pub platform: Option<String>,
    pub favorite: Option<bool>,

    #[serde(default)]
    pub exact: bool,

    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.category_id.is_none()
            && self.platform.is_none()
            && self.favorite.is_none()
    }

    /// Whether a video passes every filter in this query.
    pub fn matches(&self, video: &Video) -> bool {
        if let Some(ref id) = self.id {
            if &video.id != id {
                return false;
            }
        }

        if let Some(ref title) = self.title {
            let matched = if self.exact {
                video.title.eq_ignore_ascii_case(title)
            } else {
                video.title.to_lowercase().contains(&title.to_lowercase())
            };
            if !matched {
                return false;
            }
        }

        if let Some(ref category_id) = self.category_id {
            if &video.category_id != category_id {
                return false;
            }
        }

        if let Some(ref platform) = self.platform {
            if !video.platform.eq_ignore_ascii_case(platform) {
                return false;
            }
        }

        if let Some(favorite) = self.favorite {
            if video.is_favorite != favorite {
                return false;
            }
        }

        true
    }
}

static YOUTUBE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)([A-Za-z0-9_-]{11})",
    )
    .expect("Failed to compile YouTube regex")
});

/// Extract the 11-char YouTube video id, if this is a YouTube watch url.
pub fn youtube_video_id(url: &str) -> Option<String> {
    YOUTUBE_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_owned()))
}

/// Predictable thumbnail CDN url for a YouTube video.
pub fn youtube_thumbnail_url(url: &str) -> Option<String> {
    youtube_video_id(url)
        .map(|video_id| format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id))
}

/// Classify a video url by platform from its host.
pub fn detect_platform(url: &str) -> &'static str {
    let host = match url::Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        Err(_) => return "other",
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com") {
        "youtube"
    } else if host == "instagr.am" || host == "instagram.com" || host.ends_with(".instagram.com") {
        "instagram"
    } else if host == "tiktok.com" || host.ends_with(".tiktok.com") {
        "tiktok"
    } else if host == "fb.watch" || host == "facebook.com" || host.ends_with(".facebook.com") {
        "facebook"
    } else if host == "t.co"
        || host == "twitter.com"
        || host.ends_with(".twitter.com")
        || host == "x.com"
        || host.ends_with(".x.com")
    {
        "twitter"
    } else {
        "other"
    }
}
