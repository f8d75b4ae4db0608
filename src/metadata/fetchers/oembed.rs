use crate::config::Config;
use crate::metadata::fetchers::MetadataFetcher;
use crate::metadata::types::{format_duration, VideoMeta};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const UNFURL_TIMEOUT: Duration = Duration::from_secs(5);

/// Aggregator unfurl payload. The service returns platform oEmbed data when
/// the target supports it, alongside Open Graph fields scraped from the page
/// and a generic title/favicon pair.
#[derive(Debug, Clone, Default, Deserialize)]
struct UnfurlResponse {
    title: Option<String>,
    favicon: Option<String>,
    #[serde(rename = "oEmbed")]
    oembed: Option<OembedData>,
    open_graph: Option<OpenGraphData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OembedData {
    title: Option<String>,
    thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OpenGraphData {
    title: Option<String>,
    #[serde(default)]
    images: Vec<OgImage>,
    #[serde(default)]
    videos: Vec<OgVideo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OgImage {
    url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OgVideo {
    duration: Option<f64>,
}

/// oEmbed-preferring resolver backed by a platform-neutral unfurl
/// aggregator. oEmbed is authoritative for platforms that support it
/// (accurate titles, stable thumbnail CDNs); the aggregator's Open Graph
/// scrape is the fallback for everything else.
pub struct UnfurlFetcher;

impl UnfurlFetcher {
    pub fn new() -> Self {
        Self
    }

    fn fetch_unfurl(url: &str, config: &Config) -> anyhow::Result<UnfurlResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(UNFURL_TIMEOUT)
            .build()?;

        let compress = if config.unfurl.compress_images {
            "true"
        } else {
            "false"
        };
        let mut req = client.get(&config.unfurl.endpoint).query(&[
            ("url", url),
            ("oembed", "true"),
            ("compressed_images", compress),
        ]);

        if let Ok(key) = env::var("UNFURL_API_KEY") {
            if !key.is_empty() {
                req = req.header("x-api-key", key);
            }
        }

        let response = req.send()?;

        if !response.status().is_success() {
            anyhow::bail!("unfurl endpoint returned status {}", response.status());
        }

        Ok(response.json::<UnfurlResponse>()?)
    }

    /// Pick the winning fields out of an unfurl payload. oEmbed wins when it
    /// carries both a title and a thumbnail; otherwise Open Graph fields fill
    /// in, with the generic page title and favicon as last resorts. Duration
    /// is scavenged from the Open Graph video array either way, since oEmbed
    /// does not reliably carry it.
    fn select_meta(resp: UnfurlResponse) -> Option<VideoMeta> {
        let duration = resp
            .open_graph
            .as_ref()
            .and_then(|og| og.videos.iter().find_map(|v| v.duration))
            .map(format_duration);

        if let Some(oembed) = &resp.oembed {
            let title = oembed.title.as_deref().unwrap_or_default().trim();
            let thumbnail = oembed.thumbnail_url.as_deref().unwrap_or_default().trim();
            if !title.is_empty() && !thumbnail.is_empty() {
                return Some(VideoMeta {
                    title: title.to_string(),
                    thumbnail: Some(thumbnail.to_string()),
                    duration,
                });
            }
            log::debug!("oEmbed payload incomplete, falling back to Open Graph");
        }

        let og = resp.open_graph.as_ref();
        let title = og
            .and_then(|og| og.title.clone())
            .or(resp.title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())?;

        let thumbnail = og
            .and_then(|og| og.images.iter().find_map(|i| i.url.clone()))
            .or(resp.favicon)
            .filter(|t| !t.trim().is_empty());

        Some(VideoMeta {
            title,
            thumbnail,
            duration,
        })
    }
}

impl MetadataFetcher for UnfurlFetcher {
    fn fetch(&self, url: &str, config: &Config) -> anyhow::Result<Option<VideoMeta>> {
        let resp = Self::fetch_unfurl(url, config)?;
        Ok(Self::select_meta(resp))
    }

    fn name(&self) -> &'static str {
        "Unfurl"
    }

    fn priority(&self) -> u8 {
        1
    }
}
