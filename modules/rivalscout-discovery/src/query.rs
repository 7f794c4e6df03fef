//! Query builder: turns a project into a small ordered set of verticalized
//! search queries. Pure and deterministic — no I/O, no clock.

use rivalscout_common::{geo, ProjectProfile};

pub const MAX_QUERIES: usize = 5;

/// Build 1–5 search queries for a project. Never returns an empty list:
/// a project with nothing to work from falls back to `["startup company"]`.
pub fn build(project: &ProjectProfile) -> Vec<String> {
    let description = project.description.to_lowercase();
    let vertical = detect_vertical(&description);
    let geography = detect_geography(&description, &project.target_regions);
    let business_type = detect_business_type(&description);

    let mut queries: Vec<String> = Vec::new();

    match vertical {
        Some(phrase) => {
            let mut parts: Vec<&str> = vec![phrase];
            if let Some(t) = business_type {
                parts.push(t);
            }
            let keyword = project.keywords.first().map(|k| k.trim()).filter(|k| !k.is_empty());
            if let Some(k) = keyword {
                parts.push(k);
            }
            if let Some(g) = geography.as_deref() {
                parts.push(g);
            }
            parts.push("startup");
            queries.push(parts.join(" "));
        }
        None => {
            let name = project.name.trim();
            if !name.is_empty() {
                queries.push(format!("{name} competitors"));
            }
        }
    }

    // Keyword × region variants: a plain query per pair plus an
    // industry-qualified one when an industry is known.
    let industry = project
        .industries
        .first()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty());

    'pairs: for keyword in project.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        for region in &project.target_regions {
            if queries.len() >= MAX_QUERIES {
                break 'pairs;
            }
            let region_label = geo::region_name(region);
            push_unique(&mut queries, format!("{keyword} {region_label} startup"));

            if queries.len() >= MAX_QUERIES {
                break 'pairs;
            }
            if let Some(industry) = industry {
                push_unique(&mut queries, format!("{keyword} {industry} {region_label}"));
            }
        }
    }

    if queries.is_empty() {
        queries.push("startup company".to_string());
    }
    queries.truncate(MAX_QUERIES);
    queries
}

fn push_unique(queries: &mut Vec<String>, query: String) {
    if !queries.contains(&query) {
        queries.push(query);
    }
}

/// Prioritized keyword ladder — first match wins, so a neobank is never
/// classified as generic fintech.
fn detect_vertical(description: &str) -> Option<&'static str> {
    const LADDER: &[(&[&str], &str)] = &[
        (
            &["neobank", "challenger bank", "digital bank"],
            "neobank challenger bank mobile banking",
        ),
        (&["mobile money", "mobile wallet"], "mobile money wallet"),
        // Fintech sub-branches before the generic bucket
        (
            &["lending", "loan platform", "credit platform", "microcredit"],
            "digital lending platform",
        ),
        (
            &["remittance", "money transfer", "cross-border payment"],
            "remittance money transfer",
        ),
        (
            &["payment gateway", "payment infrastructure", "payments api", "payment api"],
            "payment infrastructure gateway",
        ),
        (
            &["savings", "wealth management", "investment app"],
            "savings investment fintech",
        ),
        (&["fintech", "payments", "payment"], "fintech payments"),
        (
            &["construction material", "building material", "cement"],
            "construction materials supplier",
        ),
        (
            &["logistics", "delivery", "last-mile", "freight", "courier"],
            "logistics delivery",
        ),
        (
            &["agritech", "agriculture", "farming", "agribusiness"],
            "agritech agriculture",
        ),
        (
            &["healthtech", "telemedicine", "digital health", "pharmacy", "healthcare"],
            "healthtech digital health",
        ),
        (
            &["marketplace", "e-commerce", "ecommerce", "online store"],
            "online marketplace e-commerce",
        ),
        (
            &["edtech", "education", "e-learning", "learning platform"],
            "edtech online learning",
        ),
    ];

    LADDER
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| description.contains(n)))
        .map(|(_, phrase)| *phrase)
}

/// Geography from description phrases first, then region-code majorities.
fn detect_geography(description: &str, regions: &[String]) -> Option<String> {
    if description.contains("west africa") {
        return Some("West Africa".to_string());
    }
    if description.contains("east africa") {
        return Some("East Africa".to_string());
    }
    for code in regions {
        let name = geo::region_name(code);
        if name != code && description.contains(&name.to_lowercase()) {
            return Some(name.to_string());
        }
    }
    if description.contains("africa") {
        return Some("Africa".to_string());
    }

    if regions.is_empty() {
        return None;
    }
    let west = regions.iter().filter(|c| geo::is_west_african(c)).count();
    let east = regions.iter().filter(|c| geo::is_east_african(c)).count();
    let african = regions.iter().filter(|c| geo::is_african(c)).count();

    if west * 2 > regions.len() {
        Some("West Africa".to_string())
    } else if east * 2 > regions.len() {
        Some("East Africa".to_string())
    } else if african > 0 {
        Some("Africa".to_string())
    } else if regions.len() == 1 {
        Some(geo::region_name(&regions[0]).to_string())
    } else {
        None
    }
}

fn detect_business_type(description: &str) -> Option<&'static str> {
    if description.contains("b2b") {
        Some("B2B")
    } else if description.contains("b2c") {
        Some("B2C")
    } else if description.contains("wholesale") {
        Some("wholesale")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn project(name: &str, description: &str) -> ProjectProfile {
        ProjectProfile {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            keywords: vec![],
            industries: vec![],
            target_regions: vec![],
        }
    }

    #[test]
    fn neobank_in_francophone_africa() {
        let p = project(
            "BankLeap",
            "A mobile-first challenger bank for francophone Africa",
        );
        let queries = build(&p);
        assert_eq!(
            queries,
            vec!["neobank challenger bank mobile banking Africa startup"]
        );
    }

    #[test]
    fn neobank_wins_over_generic_fintech() {
        let p = project("X", "A fintech neobank offering payments");
        let queries = build(&p);
        assert!(queries[0].starts_with("neobank challenger bank"));
    }

    #[test]
    fn lending_branch_beats_generic_fintech() {
        let p = project("X", "digital lending for small fintech merchants");
        let queries = build(&p);
        assert!(queries[0].starts_with("digital lending platform"));
    }

    #[test]
    fn no_vertical_falls_back_to_name_competitors() {
        let p = project("Acme Analytics", "a platform for things");
        let queries = build(&p);
        assert_eq!(queries[0], "Acme Analytics competitors");
    }

    #[test]
    fn empty_project_yields_generic_query() {
        let p = project("", "");
        assert_eq!(build(&p), vec!["startup company"]);
    }

    #[test]
    fn business_type_is_included() {
        let p = project("X", "B2B payment gateway for merchants in west africa");
        let queries = build(&p);
        assert_eq!(
            queries[0],
            "payment infrastructure gateway B2B West Africa startup"
        );
    }

    #[test]
    fn keyword_region_pairs_expand_and_cap_at_five() {
        let mut p = project("X", "logistics and delivery services");
        p.keywords = vec!["last mile delivery".to_string(), "freight".to_string()];
        p.target_regions = vec!["NG".to_string(), "KE".to_string()];
        p.industries = vec!["Logistics".to_string()];

        let queries = build(&p);
        assert!(queries.len() <= MAX_QUERIES);
        assert!(queries.len() > 1);
        assert!(queries.contains(&"last mile delivery Nigeria startup".to_string()));
        assert!(queries.contains(&"last mile delivery Logistics Nigeria".to_string()));
        for q in &queries {
            assert!(!q.trim().is_empty());
        }
    }

    #[test]
    fn majority_west_africa_regions_map_to_region_phrase() {
        let mut p = project("X", "an agritech platform for farmers");
        p.target_regions = vec!["NG".to_string(), "GH".to_string(), "KE".to_string()];
        let queries = build(&p);
        assert_eq!(queries[0], "agritech agriculture West Africa startup");
    }

    #[test]
    fn east_africa_majority() {
        let mut p = project("X", "a healthtech service");
        p.target_regions = vec!["KE".to_string(), "TZ".to_string(), "UG".to_string()];
        let queries = build(&p);
        assert_eq!(queries[0], "healthtech digital health East Africa startup");
    }

    #[test]
    fn mixed_african_regions_fall_back_to_africa() {
        let mut p = project("X", "a healthtech service");
        p.target_regions = vec![
            "NG".to_string(),
            "KE".to_string(),
            "ZA".to_string(),
            "EG".to_string(),
        ];
        let queries = build(&p);
        assert_eq!(queries[0], "healthtech digital health Africa startup");
    }

    #[test]
    fn single_non_african_region_uses_country_name() {
        let mut p = project("X", "an edtech app");
        p.target_regions = vec!["IN".to_string()];
        let queries = build(&p);
        assert_eq!(queries[0], "edtech online learning India startup");
    }

    #[test]
    fn output_bounds_hold_for_everything() {
        let cases = [
            project("", ""),
            project("Solo", "no recognizable vertical words"),
            {
                let mut p = project("Busy", "fintech payments for b2b merchants in Kenya");
                p.keywords = (0..10).map(|i| format!("kw{i}")).collect();
                p.target_regions = vec!["KE".to_string(), "TZ".to_string(), "UG".to_string()];
                p.industries = vec!["Fintech".to_string()];
                p
            },
        ];
        for p in &cases {
            let queries = build(p);
            assert!(!queries.is_empty() && queries.len() <= MAX_QUERIES);
            for q in &queries {
                assert!(!q.trim().is_empty());
            }
        }
    }
}
