pub mod fetchers;
pub mod normalize;
pub mod types;

pub use fetchers::FetcherRegistry;
pub use types::VideoMeta;

use crate::config::Config;
use crate::scrape::PageMeta;
use crate::videos;

/// Resolve title/thumbnail/duration for a pasted video url. oEmbed data from
/// the unfurl aggregator wins when present; raw page scraping is the
/// fallback. `None` means nothing usable was found anywhere.
pub fn resolve_video(url: &str, config: &Config) -> Option<VideoMeta> {
    let url = normalize::normalize_url(url);
    let registry = FetcherRegistry::new();

    let mut meta = registry.resolve(&url, config)?;

    // YouTube thumbnails are predictable; fill the gap when every source
    // came back title-only.
    if meta.thumbnail.is_none() {
        if let Some(thumb) = videos::youtube_thumbnail_url(&url) {
            log::debug!("{url}: using derived youtube thumbnail");
            meta.thumbnail = Some(thumb);
        }
    }

    Some(meta)
}

/// Direct-scrape resolution for a single page, bypassing the aggregator.
/// Never fails; unusable pages yield an empty result.
pub fn resolve_page(url: &str, config: &Config) -> PageMeta {
    let url = normalize::normalize_url(url);
    crate::scrape::resolve_page(&url, &config.scrape)
}
