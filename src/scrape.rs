use std::{error::Error, net::IpAddr, time::Duration};

use crate::config::ScrapeConfig;
use serde::{Deserialize, Serialize};

/// Best-guess page metadata pulled out of raw HTML. Both fields are
/// independent; an empty struct means the page yielded nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
}

fn is_ip_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

fn is_private_ip(host: &str) -> bool {
    use std::net::ToSocketAddrs;

    if let Ok(ip) = host.parse::<IpAddr>() {
        return is_ip_private(&ip);
    }

    if let Ok(addrs) = (host, 80).to_socket_addrs() {
        for addr in addrs {
            if is_ip_private(&addr.ip()) {
                return true;
            }
        }
    }

    false
}

fn validate_url_policy(url_parsed: &reqwest::Url, config: &ScrapeConfig) -> bool {
    if !config
        .allowed_schemes
        .iter()
        .any(|s| s == url_parsed.scheme())
    {
        log::warn!("URL scheme '{}' not allowed", url_parsed.scheme());
        return false;
    }

    let host = url_parsed.host_str().unwrap_or_default();

    if config.blocked_hosts.iter().any(|h| h == host) {
        log::warn!("Host '{}' is blocked", host);
        return false;
    }

    if config.block_private_ips && is_private_ip(host) {
        log::warn!("Host '{}' resolves to private IP (blocked by SSRF policy)", host);
        return false;
    }

    true
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

/// Fetch a page as HTML text, masquerading as a browser. One attempt,
/// fail-soft: any policy violation, network error, or non-success status
/// degrades to `None`.
pub fn fetch_html(url: &str, config: &ScrapeConfig) -> Option<String> {
    let mut url = url.to_string();

    if url.starts_with("//") {
        url = format!("https:{}", url);
    }

    let url_parsed = match reqwest::Url::parse(&url) {
        Ok(u) => u,
        Err(e) => {
            log::warn!("{url}: invalid URL: {e}");
            return None;
        }
    };
    if !validate_url_policy(&url_parsed, config) {
        return None;
    }

    let host = url_parsed.host_str().unwrap_or_default();
    let path = url_parsed.path();
    let iden = format!("{host}{path}");

    let client = match reqwest::blocking::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(err) => {
            log::error!("{iden}: couldn't build http client: {err}");
            return None;
        }
    };

    log::debug!("{iden}: requesting");

    let resp = match client.get(&url).send() {
        Ok(r) => r,
        Err(err) => {
            log::warn!("{iden}: {err}: {:#?}", get_error(&err));
            return None;
        }
    };

    let status = resp.status();
    if !status.is_success() {
        log::debug!("{iden}: {}", status);
        return None;
    }

    match resp.bytes() {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).to_string()),
        Err(err) => {
            log::warn!("{iden}: couldn't read body: {err}");
            None
        }
    }
}

/// Trim a raw title down to its first line. Multi-line captions (Instagram
/// and TikTok stuff whole post bodies into og:title) collapse to the lead
/// line.
fn clean_title(raw: &str) -> Option<String> {
    let first_line = raw.trim().split('\n').next().unwrap_or_default().trim();
    if first_line.is_empty() {
        None
    } else {
        Some(first_line.to_string())
    }
}

/// Extract a best-guess title and thumbnail from raw HTML. Pure and
/// deterministic; malformed markup yields empty fields, never an error.
///
/// Title probes, in priority order: `og:title`, `<title>`, then
/// `meta name="description"`. Thumbnail probes: `og:image`, then
/// `og:image:secure_url`.
pub fn extract_from_html(resp_text: &str) -> PageMeta {
    let document = scraper::Html::parse_document(resp_text);
    let head_selector = scraper::Selector::parse("head").unwrap();
    let meta_selector = scraper::Selector::parse("meta").unwrap();
    let title_selector = scraper::Selector::parse("title").unwrap();

    let mut og_title = None;
    let mut description = None;
    let mut og_image = None;
    let mut og_image_secure = None;

    let head = match document.select(&head_selector).next() {
        Some(h) => h,
        None => {
            return PageMeta::default();
        }
    };
    for element in head.select(&meta_selector) {
        let meta_prop = element.attr("property").unwrap_or_default();
        let meta_key = element.attr("name").or(Some(meta_prop)).unwrap_or_default();
        let meta_value = element.attr("content").unwrap_or_default();

        if meta_value.is_empty() {
            continue;
        }

        if og_title.is_none() && meta_key == "og:title" {
            og_title = Some(meta_value.to_string());
        }

        if description.is_none() && ["description", "Description"].contains(&meta_key) {
            description = Some(meta_value.to_string());
        }

        if og_image.is_none() && meta_key == "og:image" {
            og_image = Some(meta_value.to_string());
        }

        if og_image_secure.is_none() && meta_key == "og:image:secure_url" {
            og_image_secure = Some(meta_value.to_string());
        }
    }

    let title_tag = head
        .select(&title_selector)
        .next()
        .and_then(|element| element.text().next())
        .map(|text| text.to_string());

    let title = og_title
        .as_deref()
        .and_then(clean_title)
        .or_else(|| title_tag.as_deref().and_then(clean_title))
        .or_else(|| description.as_deref().and_then(clean_title));

    let thumbnail_url = og_image.or(og_image_secure);

    PageMeta {
        title,
        thumbnail_url,
    }
}

/// Resolve title/thumbnail for a video url by scraping its page directly.
/// Never fails: every error path degrades to an empty `PageMeta`. A page
/// with no resolvable title counts as a failure: the thumbnail alone is not
/// a partial success.
pub fn resolve_page(url: &str, config: &ScrapeConfig) -> PageMeta {
    let html = match fetch_html(url, config) {
        Some(html) => html,
        None => return PageMeta::default(),
    };

    let meta = extract_from_html(&html);
    if meta.title.is_none() {
        log::debug!("{url}: no title found, discarding scrape result");
        return PageMeta::default();
    }

    meta
}
