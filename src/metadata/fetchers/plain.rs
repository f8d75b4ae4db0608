use crate::config::Config;
use crate::metadata::fetchers::MetadataFetcher;
use crate::metadata::types::VideoMeta;

/// Raw page scrape, the universal fallback for platforms without oEmbed or
/// when the aggregator is down. No duration; pages don't carry one in a
/// form worth trusting.
pub struct PlainFetcher;

impl PlainFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataFetcher for PlainFetcher {
    fn fetch(&self, url: &str, config: &Config) -> anyhow::Result<Option<VideoMeta>> {
        let meta = crate::scrape::resolve_page(url, &config.scrape);

        match meta.title {
            Some(title) => Ok(Some(VideoMeta {
                title,
                thumbnail: meta.thumbnail_url,
                duration: None,
            })),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "Plain"
    }

    fn priority(&self) -> u8 {
        2
    }
}
