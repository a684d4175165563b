use serde::{Deserialize, Serialize};

/// CSS selector sets for profile pages.
///
/// The target site's markup drifts; every field carries an ordered list of
/// candidates tried until one yields usable text. Kept as configuration so
/// a drift fix is a config change, not a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSelectors {
    /// Primary content region awaited after navigation.
    pub content_region: String,
    /// Person's name on the main profile page.
    pub name: Vec<String>,
    /// Headline under the name.
    pub headline: Vec<String>,
    /// Location line.
    pub location: Vec<String>,
    /// About/summary text.
    pub about: Vec<String>,
    /// One entry in a detail list (experience or education).
    pub detail_item: Vec<String>,
    /// Bold heading inside a detail entry (job title / school).
    pub entry_heading: Vec<String>,
    /// Normal-weight subheading (company / degree).
    pub entry_subheading: Vec<String>,
    /// Muted caption (duration).
    pub entry_caption: Vec<String>,
    /// One activity post container.
    pub post_item: Vec<String>,
    /// Text inside a post.
    pub post_text: Vec<String>,
    /// Date inside a post.
    pub post_date: Vec<String>,
    /// Lowercase markers whose presence means the site served a challenge
    /// instead of content.
    pub throttle_markers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ProfileSelectors {
    fn default() -> Self {
        Self {
            content_region: "main".to_string(),
            name: strings(&["h1.text-heading-xlarge", ".text-heading-xlarge", "h1"]),
            headline: strings(&[
                ".text-body-medium.break-words",
                ".pv-text-details__left-panel .text-body-medium",
            ]),
            location: strings(&[
                ".text-body-small.inline.t-black--light.break-words",
                ".pv-text-details__left-panel .text-body-small",
            ]),
            about: strings(&[
                ".pv-about__summary-text",
                ".inline-show-more-text__text",
                ".pv-shared-text-with-see-more",
            ]),
            detail_item: strings(&[
                "ul.pvs-list__paged-list-items > li",
                "li.pvs-list__item--line-separated",
                ".pvs-entity",
            ]),
            entry_heading: strings(&[r#".t-bold span[aria-hidden="true"]"#, ".t-bold", "h3"]),
            entry_subheading: strings(&[r#".t-normal span[aria-hidden="true"]"#, ".t-normal", "h4"]),
            entry_caption: strings(&[
                r#".t-black--light span[aria-hidden="true"]"#,
                ".t-black--light",
            ]),
            post_item: strings(&[
                "article.update-components-update",
                "div.feed-shared-update-v2",
                "div.occludable-update",
            ]),
            post_text: strings(&[
                ".update-components-text",
                ".feed-shared-text",
                r#"span[dir="ltr"]"#,
            ]),
            post_date: strings(&["time", ".update-components-actor__sub-description"]),
            throttle_markers: strings(&[
                "captcha",
                "unusual activity",
                "too many requests",
                "security verification",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_default_selectors_are_valid_css() {
        let selectors = ProfileSelectors::default();
        let all = selectors
            .name
            .iter()
            .chain(&selectors.headline)
            .chain(&selectors.location)
            .chain(&selectors.about)
            .chain(&selectors.detail_item)
            .chain(&selectors.entry_heading)
            .chain(&selectors.entry_subheading)
            .chain(&selectors.entry_caption)
            .chain(&selectors.post_item)
            .chain(&selectors.post_text)
            .chain(&selectors.post_date);

        for candidate in all {
            assert!(
                Selector::parse(candidate).is_ok(),
                "invalid selector: {candidate}"
            );
        }
        assert!(Selector::parse(&selectors.content_region).is_ok());
    }

    #[test]
    fn test_serde_round_trip() {
        let selectors = ProfileSelectors::default();
        let json = serde_json::to_string(&selectors).expect("serialize selectors");
        let parsed: ProfileSelectors = serde_json::from_str(&json).expect("deserialize selectors");
        assert_eq!(parsed.name, selectors.name);
        assert_eq!(parsed.throttle_markers, selectors.throttle_markers);
    }
}
