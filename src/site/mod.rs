//! The news site, seen through the operations the pager needs.
//!
//! [`SearchPage`] is the seam between the pagination logic and the live DOM:
//! [`browser::NewsSite`] implements it over a WebDriver session, and the test
//! fixture implements it over static HTML. Everything that depends on the
//! site's markup lives in [`SiteConfig`] so selector drift is a config change.
//!
//! # Default Selectors
//!
//! | Purpose | Selector |
//! |---------|----------|
//! | Cookie banner | `button#onetrust-accept-btn-handler` |
//! | Search toggle | `button[data-element='search-button']` |
//! | Search input | `input[data-element='search-form-input']` |
//! | Search submit | `button[data-element='search-submit-button']` |
//! | Category options | `ul[data-name='Topics'] li label` |
//! | Sort by newest | `select.select-input option[value='1']` |
//! | Result cards | `ul.search-results-module-results-menu > li` |
//! | Card image | `img.image` |
//! | Next page | `div.search-results-module-next-page a` |

pub mod browser;
#[cfg(test)]
pub mod fixture;

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
    #[error("expected element not found: {0}")]
    MissingElement(String),
    #[error("category {0:?} is not offered by the site's filter")]
    CategoryUnavailable(String),
}

/// Read access to the current page of search results, plus navigation.
///
/// Cards are returned in display order. A card handle is only valid until
/// the next call to [`SearchPage::next_page`].
pub trait SearchPage {
    type Card;

    /// Result cards currently rendered, top to bottom.
    async fn cards(&self) -> Result<Vec<Self::Card>, PageError>;

    /// Rendered text of a card, one line per visual line.
    async fn card_text(&self, card: &Self::Card) -> Result<String, PageError>;

    /// The card thumbnail's URL, or `None` if it has not rendered yet.
    async fn image_src(&self, card: &Self::Card) -> Result<Option<String>, PageError>;

    /// Whether the "next page" control is present and enabled.
    async fn has_next_page(&self) -> Result<bool, PageError>;

    /// Navigate to the next page of results.
    async fn next_page(&self) -> Result<(), PageError>;
}

/// Site location, selectors, and timing.
///
/// Every field has a default, so a YAML override only needs the keys that
/// changed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Seconds to let results re-render after filtering or sorting.
    pub settle_secs: u64,
    pub selectors: Selectors,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub cookie_consent: String,
    pub search_button: String,
    pub search_input: String,
    pub search_submit: String,
    pub category_option: String,
    pub sort_newest: String,
    pub result_card: String,
    pub card_image: String,
    pub next_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com/".to_string(),
            settle_secs: 3,
            selectors: Selectors::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            cookie_consent: "button#onetrust-accept-btn-handler".into(),
            search_button: "button[data-element='search-button']".into(),
            search_input: "input[data-element='search-form-input']".into(),
            search_submit: "button[data-element='search-submit-button']".into(),
            category_option: "ul[data-name='Topics'] li label".into(),
            sort_newest: "select.select-input option[value='1']".into(),
            result_card: "ul.search-results-module-results-menu > li".into(),
            card_image: "img.image".into(),
            next_page: "div.search-results-module-next-page a".into(),
        }
    }
}

impl SiteConfig {
    /// Load overrides from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml = tokio::fs::read_to_string(path).await?;
        let config: SiteConfig = serde_yaml::from_str(&yaml)?;
        info!(base_url = %config.base_url, "Loaded site config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: SiteConfig = serde_yaml::from_str(
            "base_url: https://news.example.com/\nselectors:\n  next_page: a.next\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://news.example.com/");
        assert_eq!(config.selectors.next_page, "a.next");
        assert_eq!(config.selectors.result_card, Selectors::default().result_card);
        assert_eq!(config.settle_secs, 3);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_secs: 0").unwrap();
        let config = SiteConfig::load(file.path()).await.unwrap();
        assert_eq!(config.settle_secs, 0);
        assert_eq!(config.base_url, SiteConfig::default().base_url);
    }

    #[tokio::test]
    async fn test_load_rejects_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_secs: [not a number").unwrap();
        assert!(SiteConfig::load(file.path()).await.is_err());
    }
}
