//! Command-line interface definitions.
//!
//! Work comes either from a JSON file of payloads (`--work-items`) or from a
//! single item given inline with `--topic`, `--category` and `--months`.
//! Run settings can also be provided through environment variables.

use crate::models::{MonthsValue, WorkItemPayload, WorkItemsFile};
use crate::pager::{DelayRange, MalformedDatePolicy, MissingImagePolicy};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # One search, inline
/// newsdesk_scraper --topic "automation" --category "Business" --months 2
///
/// # A batch of searches
/// newsdesk_scraper --work-items items.json --output-dir ./output
///
/// # Against a different WebDriver with tweaked selectors
/// newsdesk_scraper --work-items items.json --webdriver-url http://chrome:4444 --site-config site.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file holding one payload object or an array of them
    #[arg(short, long, conflicts_with_all = ["topic", "category", "months"])]
    pub work_items: Option<PathBuf>,

    /// Search phrase for a single inline work item
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Category for a single inline work item
    #[arg(short, long)]
    pub category: Option<String>,

    /// Lookback window in months for a single inline work item
    #[arg(short, long)]
    pub months: Option<String>,

    /// Directory for the report, images and ledger; cleared of old run files at startup
    #[arg(short, long, env = "NEWSDESK_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// WebDriver server to start browser sessions on
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Optional YAML file overriding the site URL and selectors
    #[arg(long, env = "NEWSDESK_SITE_CONFIG")]
    pub site_config: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, env = "NEWSDESK_HEADLESS")]
    pub headless: bool,

    /// Shortest pause between result pages, in seconds
    #[arg(long, default_value_t = 5)]
    pub min_delay_secs: u64,

    /// Longest pause between result pages, in seconds
    #[arg(long, default_value_t = 10)]
    pub max_delay_secs: u64,

    /// Skip cards whose date cannot be parsed instead of failing the item
    #[arg(long)]
    pub skip_malformed_dates: bool,

    /// Fail the item when an image cannot be fetched instead of leaving it blank
    #[arg(long)]
    pub strict_images: bool,

    /// Timeout for each image download, in seconds
    #[arg(long, default_value_t = 30)]
    pub image_timeout_secs: u64,
}

impl Cli {
    pub fn delay(&self) -> DelayRange {
        DelayRange::new(
            Duration::from_secs(self.min_delay_secs),
            Duration::from_secs(self.max_delay_secs),
        )
    }

    pub fn malformed_date_policy(&self) -> MalformedDatePolicy {
        if self.skip_malformed_dates {
            MalformedDatePolicy::Skip
        } else {
            MalformedDatePolicy::Abort
        }
    }

    pub fn missing_image_policy(&self) -> MissingImagePolicy {
        if self.strict_images {
            MissingImagePolicy::Abort
        } else {
            MissingImagePolicy::BlankPath
        }
    }

    /// Collect the run's payloads from the work-items file or inline flags.
    ///
    /// Inline flags are passed through as-is, so a missing flag surfaces as a
    /// `MISSING_KEYS` outcome rather than a CLI error.
    #[instrument(level = "info", skip_all)]
    pub async fn payloads(&self) -> Result<Vec<WorkItemPayload>, Box<dyn Error>> {
        if let Some(path) = &self.work_items {
            let raw = tokio::fs::read_to_string(path).await?;
            let file: WorkItemsFile = serde_json::from_str(&raw)?;
            let payloads = file.into_payloads();
            info!(path = %path.display(), count = payloads.len(), "Loaded work items");
            return Ok(payloads);
        }

        if self.topic.is_none() && self.category.is_none() && self.months.is_none() {
            return Err("no work given: pass --work-items or --topic/--category/--months".into());
        }
        Ok(vec![WorkItemPayload {
            topic: self.topic.clone(),
            category: self.category.clone(),
            months: self.months.clone().map(MonthsValue::Text),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_inline_item() {
        let cli = Cli::parse_from([
            "newsdesk_scraper",
            "--topic",
            "automation",
            "--category",
            "Business",
            "--months",
            "2",
        ]);

        assert_eq!(cli.topic.as_deref(), Some("automation"));
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.delay(), DelayRange::default());
        assert_eq!(cli.malformed_date_policy(), MalformedDatePolicy::Abort);
        assert_eq!(cli.missing_image_policy(), MissingImagePolicy::BlankPath);
    }

    #[test]
    fn test_cli_short_flags_and_policies() {
        let cli = Cli::parse_from([
            "newsdesk_scraper",
            "-w",
            "/tmp/items.json",
            "-o",
            "/tmp/out",
            "--skip-malformed-dates",
            "--strict-images",
            "--min-delay-secs",
            "0",
            "--max-delay-secs",
            "0",
        ]);

        assert_eq!(cli.work_items, Some(PathBuf::from("/tmp/items.json")));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cli.delay(), DelayRange::none());
        assert_eq!(cli.malformed_date_policy(), MalformedDatePolicy::Skip);
        assert_eq!(cli.missing_image_policy(), MissingImagePolicy::Abort);
    }

    #[test]
    fn test_work_items_conflicts_with_inline_item() {
        let result = Cli::try_parse_from([
            "newsdesk_scraper",
            "--work-items",
            "items.json",
            "--topic",
            "automation",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_payloads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"topic": "automation", "category": "Business", "months": "3"}}, {{"topic": "x"}}]"#
        )
        .unwrap();
        let cli = Cli::parse_from([
            "newsdesk_scraper",
            "--work-items",
            file.path().to_str().unwrap(),
        ]);

        let payloads = cli.payloads().await.unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].months, Some(MonthsValue::Text("3".into())));
        assert_eq!(payloads[1].category, None);
    }

    #[tokio::test]
    async fn test_payloads_inline_and_missing() {
        let cli = Cli::parse_from(["newsdesk_scraper", "--topic", "automation"]);
        let payloads = cli.payloads().await.unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].category, None);

        let cli = Cli::parse_from(["newsdesk_scraper"]);
        assert!(cli.payloads().await.is_err());
    }
}
