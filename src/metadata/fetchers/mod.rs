pub mod oembed;
pub mod plain;

use crate::config::Config;
use crate::metadata::types::VideoMeta;

/// A metadata resolution strategy. `Ok(None)` means "nothing usable from
/// this source", and the next fetcher gets a turn; errors are logged by the
/// registry and treated the same way.
pub trait MetadataFetcher: Send + Sync {
    fn fetch(&self, url: &str, config: &Config) -> anyhow::Result<Option<VideoMeta>>;

    fn name(&self) -> &'static str;

    /// Lower = tried first.
    fn priority(&self) -> u8;
}

pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn MetadataFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        let mut fetchers: Vec<Box<dyn MetadataFetcher>> = vec![
            Box::new(oembed::UnfurlFetcher::new()),
            Box::new(plain::PlainFetcher::new()),
        ];
        fetchers.sort_by_key(|f| f.priority());

        Self { fetchers }
    }

    /// Try fetchers in priority order and return the first usable result.
    /// The unfurl aggregator is authoritative when it answers; raw page
    /// scraping is the universal fallback.
    pub fn resolve(&self, url: &str, config: &Config) -> Option<VideoMeta> {
        for fetcher in &self.fetchers {
            let name = fetcher.name();
            match fetcher.fetch(url, config) {
                Ok(Some(meta)) => {
                    log::info!("fetcher={name} outcome=success title={:?}", meta.title);
                    return Some(meta);
                }
                Ok(None) => {
                    log::info!("fetcher={name} outcome=skip");
                }
                Err(e) => {
                    log::warn!("fetcher={name} outcome=error err={e}");
                }
            }
        }

        None
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
