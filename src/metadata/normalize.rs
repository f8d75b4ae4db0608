use url::Url;

const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "igsh",
    "si",
];

/// Normalize a user-pasted video url before resolution: upgrade
/// protocol-relative urls to https, lowercase the host, and strip share
/// tracking parameters. Returns the original string when it doesn't parse.
pub fn normalize_url(url: &str) -> String {
    let url_to_parse = if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    };

    let mut parsed = match Url::parse(&url_to_parse) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };

    if let Some(host) = parsed.host_str() {
        let lowercased = host.to_lowercase();
        if parsed.set_host(Some(&lowercased)).is_err() {
            return url.to_string();
        }
    }

    let kept_params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    parsed.set_query(None);
    if !kept_params.is_empty() {
        let query_string = kept_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query_string));
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tracking_params() {
        assert_eq!(
            normalize_url("https://youtu.be/abc?si=XyZ&utm_source=share"),
            "https://youtu.be/abc"
        );
    }

    #[test]
    fn test_keep_functional_params() {
        assert_eq!(
            normalize_url("https://www.youtube.com/watch?v=abc&t=42&fbclid=123"),
            "https://www.youtube.com/watch?v=abc&t=42"
        );
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(
            normalize_url("https://WWW.TikTok.COM/@user/video/1"),
            "https://www.tiktok.com/@user/video/1"
        );
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            normalize_url("//www.instagram.com/reel/abc/"),
            "https://www.instagram.com/reel/abc/"
        );
    }

    #[test]
    fn test_unparsable_returned_verbatim() {
        assert_eq!(normalize_url("not a url"), "not a url");
    }
}
