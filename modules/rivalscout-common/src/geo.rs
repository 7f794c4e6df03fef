//! Country tables: ISO-3166 alpha-2 resolution and human-readable names.
//!
//! The extractor receives country strings in whatever form the source page
//! used ("Nigeria", "NGA", "ng"); everything downstream works in uppercase
//! alpha-2. Strings that resolve through none of the tables are dropped by
//! the caller rather than guessed.

/// Resolve a country name, alpha-3, or alpha-2 string to uppercase alpha-2.
pub fn country_to_iso2(raw: &str) -> Option<&'static str> {
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    // Already alpha-2
    if needle.len() == 2 {
        return ISO2_NAMES
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(&needle))
            .map(|(code, _)| *code);
    }

    for (name, code) in NAME_TO_ISO2 {
        if *name == needle {
            return Some(code);
        }
    }
    for (a3, code) in ISO3_TO_ISO2 {
        if a3.eq_ignore_ascii_case(&needle) {
            return Some(code);
        }
    }
    None
}

/// Human-readable name for an alpha-2 code. Unknown codes echo back the code.
pub fn region_name(code: &str) -> &str {
    let upper = code.trim();
    ISO2_NAMES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(upper))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn is_west_african(code: &str) -> bool {
    WEST_AFRICA.iter().any(|c| c.eq_ignore_ascii_case(code))
}

pub fn is_east_african(code: &str) -> bool {
    EAST_AFRICA.iter().any(|c| c.eq_ignore_ascii_case(code))
}

pub fn is_african(code: &str) -> bool {
    is_west_african(code)
        || is_east_african(code)
        || OTHER_AFRICA.iter().any(|c| c.eq_ignore_ascii_case(code))
}

const WEST_AFRICA: &[&str] = &[
    "BJ", "BF", "CV", "CI", "GM", "GH", "GN", "GW", "LR", "ML", "MR", "NE", "NG", "SN", "SL", "TG",
];

const EAST_AFRICA: &[&str] = &[
    "BI", "DJ", "ER", "ET", "KE", "KM", "MG", "MU", "MW", "MZ", "RW", "SC", "SO", "SS", "TZ", "UG",
];

const OTHER_AFRICA: &[&str] = &[
    "AO", "BW", "CD", "CF", "CG", "CM", "DZ", "EG", "GA", "GQ", "LS", "LY", "MA", "NA", "SD", "ST",
    "SZ", "TD", "TN", "ZA", "ZM", "ZW",
];

const ISO2_NAMES: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AO", "Angola"),
    ("BD", "Bangladesh"),
    ("BF", "Burkina Faso"),
    ("BJ", "Benin"),
    ("BR", "Brazil"),
    ("BW", "Botswana"),
    ("CA", "Canada"),
    ("CD", "Democratic Republic of the Congo"),
    ("CI", "Ivory Coast"),
    ("CM", "Cameroon"),
    ("CN", "China"),
    ("CV", "Cape Verde"),
    ("DE", "Germany"),
    ("DZ", "Algeria"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("ET", "Ethiopia"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GH", "Ghana"),
    ("GM", "Gambia"),
    ("GN", "Guinea"),
    ("ID", "Indonesia"),
    ("IN", "India"),
    ("KE", "Kenya"),
    ("LR", "Liberia"),
    ("MA", "Morocco"),
    ("ML", "Mali"),
    ("MR", "Mauritania"),
    ("MU", "Mauritius"),
    ("MW", "Malawi"),
    ("MX", "Mexico"),
    ("MZ", "Mozambique"),
    ("NE", "Niger"),
    ("NG", "Nigeria"),
    ("NL", "Netherlands"),
    ("PK", "Pakistan"),
    ("RW", "Rwanda"),
    ("SA", "Saudi Arabia"),
    ("SD", "Sudan"),
    ("SG", "Singapore"),
    ("SL", "Sierra Leone"),
    ("SN", "Senegal"),
    ("SO", "Somalia"),
    ("SS", "South Sudan"),
    ("TD", "Chad"),
    ("TG", "Togo"),
    ("TN", "Tunisia"),
    ("TZ", "Tanzania"),
    ("UG", "Uganda"),
    ("US", "United States"),
    ("ZA", "South Africa"),
    ("ZM", "Zambia"),
    ("ZW", "Zimbabwe"),
];

const NAME_TO_ISO2: &[(&str, &str)] = &[
    ("algeria", "DZ"),
    ("angola", "AO"),
    ("bangladesh", "BD"),
    ("benin", "BJ"),
    ("botswana", "BW"),
    ("brazil", "BR"),
    ("burkina faso", "BF"),
    ("cameroon", "CM"),
    ("canada", "CA"),
    ("cape verde", "CV"),
    ("chad", "TD"),
    ("china", "CN"),
    ("côte d'ivoire", "CI"),
    ("cote d'ivoire", "CI"),
    ("democratic republic of the congo", "CD"),
    ("drc", "CD"),
    ("egypt", "EG"),
    ("ethiopia", "ET"),
    ("france", "FR"),
    ("gambia", "GM"),
    ("germany", "DE"),
    ("ghana", "GH"),
    ("guinea", "GN"),
    ("india", "IN"),
    ("indonesia", "ID"),
    ("ivory coast", "CI"),
    ("kenya", "KE"),
    ("liberia", "LR"),
    ("malawi", "MW"),
    ("mali", "ML"),
    ("mauritania", "MR"),
    ("mauritius", "MU"),
    ("mexico", "MX"),
    ("morocco", "MA"),
    ("mozambique", "MZ"),
    ("netherlands", "NL"),
    ("niger", "NE"),
    ("nigeria", "NG"),
    ("pakistan", "PK"),
    ("rwanda", "RW"),
    ("saudi arabia", "SA"),
    ("senegal", "SN"),
    ("sierra leone", "SL"),
    ("singapore", "SG"),
    ("somalia", "SO"),
    ("south africa", "ZA"),
    ("south sudan", "SS"),
    ("spain", "ES"),
    ("sudan", "SD"),
    ("tanzania", "TZ"),
    ("togo", "TG"),
    ("tunisia", "TN"),
    ("uganda", "UG"),
    ("united arab emirates", "AE"),
    ("uae", "AE"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("united states", "US"),
    ("usa", "US"),
    ("zambia", "ZM"),
    ("zimbabwe", "ZW"),
];

const ISO3_TO_ISO2: &[(&str, &str)] = &[
    ("AGO", "AO"),
    ("ARE", "AE"),
    ("BEN", "BJ"),
    ("BFA", "BF"),
    ("BWA", "BW"),
    ("CAN", "CA"),
    ("CIV", "CI"),
    ("CMR", "CM"),
    ("COD", "CD"),
    ("DEU", "DE"),
    ("DZA", "DZ"),
    ("EGY", "EG"),
    ("ETH", "ET"),
    ("FRA", "FR"),
    ("GBR", "GB"),
    ("GHA", "GH"),
    ("GIN", "GN"),
    ("GMB", "GM"),
    ("IND", "IN"),
    ("KEN", "KE"),
    ("LBR", "LR"),
    ("MAR", "MA"),
    ("MLI", "ML"),
    ("MOZ", "MZ"),
    ("MRT", "MR"),
    ("MUS", "MU"),
    ("MWI", "MW"),
    ("NER", "NE"),
    ("NGA", "NG"),
    ("RWA", "RW"),
    ("SDN", "SD"),
    ("SEN", "SN"),
    ("SGP", "SG"),
    ("SLE", "SL"),
    ("SOM", "SO"),
    ("SSD", "SS"),
    ("TCD", "TD"),
    ("TGO", "TG"),
    ("TUN", "TN"),
    ("TZA", "TZ"),
    ("UGA", "UG"),
    ("USA", "US"),
    ("ZAF", "ZA"),
    ("ZMB", "ZM"),
    ("ZWE", "ZW"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_alpha3_and_alpha2() {
        assert_eq!(country_to_iso2("nigeria"), Some("NG"));
        assert_eq!(country_to_iso2("NGA"), Some("NG"));
        assert_eq!(country_to_iso2("ng"), Some("NG"));
        assert_eq!(country_to_iso2("Nigeria "), Some("NG"));
    }

    #[test]
    fn unknown_strings_are_dropped_not_guessed() {
        assert_eq!(country_to_iso2("atlantis"), None);
        assert_eq!(country_to_iso2(""), None);
        assert_eq!(country_to_iso2("zz"), None);
    }

    #[test]
    fn region_name_round_trip() {
        assert_eq!(region_name("NG"), "Nigeria");
        assert_eq!(region_name("gh"), "Ghana");
        assert_eq!(region_name("XX"), "XX");
    }

    #[test]
    fn africa_partitions() {
        assert!(is_west_african("NG"));
        assert!(!is_west_african("KE"));
        assert!(is_east_african("KE"));
        assert!(is_african("ZA"));
        assert!(!is_african("US"));
    }
}
