//! URL and domain normalization.
//!
//! The dedup key for a competitor is its normalized domain: lowercased
//! hostname with a leading `www.` removed. Two runs that discover
//! `https://www.paystack.com/` and `http://paystack.com/pricing` must agree
//! on the key `paystack.com`.

/// Normalize a website URL to its dedup key.
/// Returns `None` when the input has no parseable hostname.
pub fn normalize_domain(website: &str) -> Option<String> {
    let candidate = if website.contains("://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };
    let parsed = url::Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// Canonicalize a website URL for storage: ensure an https scheme and
/// strip trailing slashes. Non-URLs are returned trimmed as-is.
pub fn normalize_website_url(website: &str) -> String {
    let trimmed = website.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_www_and_lowercases() {
        assert_eq!(
            normalize_domain("https://WWW.Paystack.com/pricing").as_deref(),
            Some("paystack.com")
        );
    }

    #[test]
    fn normalize_accepts_bare_domains() {
        assert_eq!(normalize_domain("kuda.com").as_deref(), Some("kuda.com"));
        assert_eq!(
            normalize_domain("www.carbon.ng").as_deref(),
            Some("carbon.ng")
        );
    }

    #[test]
    fn normalize_agrees_across_schemes() {
        let a = normalize_domain("http://flutterwave.com/");
        let b = normalize_domain("https://www.flutterwave.com/about");
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("not a url at all"), None);
    }

    #[test]
    fn website_url_gains_scheme_and_loses_trailing_slash() {
        assert_eq!(
            normalize_website_url("kuda.com/"),
            "https://kuda.com".to_string()
        );
        assert_eq!(
            normalize_website_url("https://carbon.ng///"),
            "https://carbon.ng".to_string()
        );
    }
}
