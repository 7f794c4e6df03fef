//! Social link extraction and profile metric parsing.
//!
//! Profile URLs are always extracted deterministically by regex from raw
//! page content and preferred over model output. Follower/employee/like
//! counts are parsed with locale-aware patterns (English and French) and
//! K/M suffix expansion.

use once_cell::sync::Lazy;
use regex::Regex;

use rivalscout_common::SocialLinks;

/// Path segments that are share widgets, not profiles.
const EXCLUDED_PATHS: &[&str] = &["/intent", "/share", "/sharer", "/home"];

static LINKEDIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-z]{2,3}\.)?linkedin\.com/(?:company|school|in)/[A-Za-z0-9_.%\-]+")
        .expect("valid regex")
});

static TWITTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:twitter\.com|x\.com)/[A-Za-z0-9_]+").expect("valid regex")
});

static FACEBOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?facebook\.com/[A-Za-z0-9_.\-]+").expect("valid regex")
});

static INSTAGRAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?instagram\.com/[A-Za-z0-9_.\-]+").expect("valid regex")
});

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?youtube\.com/(?:@|c/|channel/|user/)[A-Za-z0-9_.\-]+")
        .expect("valid regex")
});

fn first_profile_match(re: &Regex, content: &str) -> Option<String> {
    re.find_iter(content)
        .map(|m| m.as_str().trim_end_matches('/').to_string())
        .find(|url| {
            let lower = url.to_lowercase();
            !EXCLUDED_PATHS.iter().any(|p| lower.contains(p))
        })
}

/// Extract the first profile link per network from raw content.
pub fn extract_social_links(content: &str) -> SocialLinks {
    SocialLinks {
        linkedin: first_profile_match(&LINKEDIN_RE, content),
        twitter: first_profile_match(&TWITTER_RE, content),
        facebook: first_profile_match(&FACEBOOK_RE, content),
        instagram: first_profile_match(&INSTAGRAM_RE, content),
        youtube: first_profile_match(&YOUTUBE_RE, content),
    }
}

/// Slug for synthesized profile guesses: lowercase, alphanumerics only.
pub fn company_slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Guess plausible profile URLs from a company name. These are a UI
/// convenience and stay unverified: they appear in `social_links` without a
/// matching `data_sources` entry unless a probe later confirms them.
pub fn synthesize_social_links(name: &str) -> SocialLinks {
    let slug = company_slug(name);
    if slug.is_empty() {
        return SocialLinks::default();
    }
    SocialLinks {
        linkedin: Some(format!("https://linkedin.com/company/{slug}")),
        twitter: Some(format!("https://twitter.com/{slug}")),
        facebook: Some(format!("https://facebook.com/{slug}")),
        instagram: None,
        youtube: None,
    }
}

// ---------------------------------------------------------------------------
// Metric parsing
// ---------------------------------------------------------------------------

static LINKEDIN_FOLLOWERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d][\d,.\s]*)\s*(?:followers|abonnés)").expect("valid regex")
});

static LINKEDIN_EMPLOYEES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d][\d,.\s]*)\s*(?:employees|employés)").expect("valid regex")
});

static TWITTER_FOLLOWERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d][\d,.]*[KMB]?)\s*(?:followers|abonnés)").expect("valid regex")
});

static FACEBOOK_LIKES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d][\d,.]*[KMB]?)\s*(?:likes|j'aime)").expect("valid regex")
});

static FACEBOOK_FOLLOWERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d][\d,.]*[KMB]?)\s*(?:followers|abonnés)").expect("valid regex")
});

/// Parse a compact count like `32.5K`, `1.2M`, `48,000`.
pub fn parse_compact_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.trim().replace([',', ' '], "");
    if cleaned.is_empty() {
        return None;
    }
    let (number_part, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000f64),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000f64),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000f64),
        _ => (cleaned.as_str(), 1f64),
    };
    let value: f64 = number_part.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

pub fn parse_linkedin_followers(content: &str) -> Option<u64> {
    let capture = LINKEDIN_FOLLOWERS_RE.captures(content)?;
    parse_compact_count(capture.get(1)?.as_str())
}

pub fn parse_linkedin_employees(content: &str) -> Option<u64> {
    let capture = LINKEDIN_EMPLOYEES_RE.captures(content)?;
    parse_compact_count(capture.get(1)?.as_str())
}

pub fn parse_twitter_followers(content: &str) -> Option<u64> {
    let capture = TWITTER_FOLLOWERS_RE.captures(content)?;
    parse_compact_count(capture.get(1)?.as_str())
}

pub fn parse_facebook_likes(content: &str) -> Option<u64> {
    let capture = FACEBOOK_LIKES_RE.captures(content)?;
    parse_compact_count(capture.get(1)?.as_str())
}

pub fn parse_facebook_followers(content: &str) -> Option<u64> {
    let capture = FACEBOOK_FOLLOWERS_RE.captures(content)?;
    parse_compact_count(capture.get(1)?.as_str())
}
