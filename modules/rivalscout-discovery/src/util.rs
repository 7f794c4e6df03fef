//! Parsing helpers shared across the pipeline.

/// Slice the first `[` … last `]` span out of model output. Models wrap
/// JSON in prose and code fences often enough that this is the reliable
/// way to find the array.
pub fn slice_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Like `slice_json_array` but for a single object.
pub fn slice_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse funding strings like `$1.2M`, `€800K`, `$3B` to a numeric
/// USD-equivalent. Unparseable input is `None`, never a guess.
pub fn parse_funding(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .replace(',', "")
        .replace(' ', "");
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
    Some((value * multiplier).round() as i64)
}

/// Truncate at a char boundary at or below `max_bytes`.
pub fn truncate_chars(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funding_suffix_table() {
        assert_eq!(parse_funding("$2.5B"), Some(2_500_000_000));
        assert_eq!(parse_funding("€800K"), Some(800_000));
        assert_eq!(parse_funding("$1.2M"), Some(1_200_000));
        assert_eq!(parse_funding("$3B"), Some(3_000_000_000));
        assert_eq!(parse_funding("500000"), Some(500_000));
        assert_eq!(parse_funding("£1,500,000"), Some(1_500_000));
    }

    #[test]
    fn funding_garbage_is_none() {
        assert_eq!(parse_funding("tbd"), None);
        assert_eq!(parse_funding(""), None);
        assert_eq!(parse_funding("undisclosed"), None);
        assert_eq!(parse_funding("-5M"), None);
    }

    #[test]
    fn array_slicing_survives_prose() {
        let text = "Here are the companies:\n```json\n[{\"name\":\"Kuda\"}]\n```\nDone.";
        assert_eq!(slice_json_array(text), Some("[{\"name\":\"Kuda\"}]"));
        assert_eq!(slice_json_array("no array here"), None);
        assert_eq!(slice_json_array("] backwards ["), None);
    }

    #[test]
    fn object_slicing() {
        let text = "Result: {\"a\": 1} trailing";
        assert_eq!(slice_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "abcdé"; // é is 2 bytes
        let cut = truncate_chars(text, 5);
        assert_eq!(cut, "abcd");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
