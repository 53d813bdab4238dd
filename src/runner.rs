//! Work-item processing.
//!
//! For each payload, in order:
//! 1. Validate it; a bad payload fails with its validation code and never
//!    touches the browser
//! 2. Compute the lookback cutoff, then open a browser session, search, and
//!    walk the result pages
//! 3. Close the session, whether the walk succeeded or not
//! 4. On success, add the records to the run's report and rewrite
//!    `output.xlsx`; on failure, save a screenshot if possible
//!
//! A failed item never stops the run; the next item is processed as usual.

use crate::errors::PipelineError;
use crate::images::ImageDownloader;
use crate::models::{OutcomeStatus, ReportTable, WorkItemOutcome, WorkItemPayload};
use crate::outputs::xlsx;
use crate::pager::{PagerConfig, PagerRun, ResultPager};
use crate::site::browser::NewsSite;
use crate::site::{SearchPage, SiteConfig};
use crate::validation::{validate, SearchRequest};
use crate::window;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

pub const REPORT_FILE: &str = "output.xlsx";
pub const SCREENSHOT_FILE: &str = "error_screenshot.png";

/// Everything a run needs besides the payloads.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub webdriver_url: String,
    pub headless: bool,
    pub site: SiteConfig,
    pub pager: PagerConfig,
    /// Reference date for the lookback window.
    pub today: NaiveDate,
}

pub struct Runner<D> {
    settings: RunSettings,
    downloader: D,
    report: ReportTable,
    report_written: bool,
}

impl<D: ImageDownloader> Runner<D> {
    pub fn new(settings: RunSettings, downloader: D) -> Self {
        Self {
            settings,
            downloader,
            report: ReportTable::default(),
            report_written: false,
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.settings.output_dir.join(REPORT_FILE)
    }

    /// Process every payload in order and return one outcome per payload.
    ///
    /// The report is always left on disk, header-only if nothing succeeded.
    pub async fn run_all(&mut self, payloads: Vec<WorkItemPayload>) -> Vec<WorkItemOutcome> {
        let mut outcomes = Vec::with_capacity(payloads.len());
        for (item, payload) in payloads.into_iter().enumerate() {
            let outcome = self.process(item, &payload).await;
            match &outcome.status {
                OutcomeStatus::Done { records, pages } => {
                    info!(item, records, pages, "Work item done");
                }
                OutcomeStatus::Failed { code, message } => {
                    warn!(item, %code, %message, "Work item failed");
                }
            }
            outcomes.push(outcome);
        }

        if !self.report_written {
            if let Err(e) = xlsx::write_report(&self.report, &self.report_path()) {
                error!(error = %e, "Failed to write empty report");
            }
        }
        outcomes
    }

    #[instrument(level = "info", skip_all, fields(item = item))]
    async fn process(&mut self, item: usize, payload: &WorkItemPayload) -> WorkItemOutcome {
        let topic = payload.topic.clone();
        let status = match self.process_valid(payload).await {
            Ok(run) => OutcomeStatus::Done {
                records: run.table.len(),
                pages: run.pages,
            },
            Err(e) => OutcomeStatus::Failed {
                code: e.code(),
                message: e.to_string(),
            },
        };
        WorkItemOutcome { item, topic, status }
    }

    async fn process_valid(&mut self, payload: &WorkItemPayload) -> Result<PagerRun, PipelineError> {
        let request = validate(payload)?;
        let cutoff = window::cutoff(self.settings.today, request.months().into())?;
        info!(today = %self.settings.today, %cutoff, "Computed cutoff");
        let run = self.scrape(&request, cutoff).await?;
        self.record_success(&run)?;
        Ok(run)
    }

    /// Add a finished item's records to the report and rewrite it.
    fn record_success(&mut self, run: &PagerRun) -> Result<(), PipelineError> {
        let mut report = self.report.clone();
        report.append(run.table.clone());
        xlsx::write_report(&report, &self.report_path())?;
        self.report = report;
        self.report_written = true;
        Ok(())
    }

    async fn scrape(&self, request: &SearchRequest, cutoff: NaiveDate) -> Result<PagerRun, PipelineError> {
        let site = NewsSite::launch(
            &self.settings.webdriver_url,
            self.settings.headless,
            self.settings.site.clone(),
        )
        .await?;

        let result = match site.open_search(request).await {
            Ok(()) => {
                collect(
                    &site,
                    &self.downloader,
                    &self.settings.pager,
                    request,
                    cutoff,
                )
                .await
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            error!(code = %e.code(), error = %e, "Scrape failed");
            let shot = self.settings.output_dir.join(SCREENSHOT_FILE);
            match site.screenshot(&shot).await {
                Ok(()) => info!(path = %shot.display(), "Saved error screenshot"),
                Err(e) => warn!(error = %e, "Could not save error screenshot"),
            }
        }
        if let Err(e) = site.close().await {
            warn!(error = %e, "Browser session did not close cleanly");
        }
        result
    }
}

/// Walk the pages of `page` for `request`, stopping at `cutoff`.
#[instrument(level = "info", skip_all, fields(phrase = %request.phrase(), months = request.months()))]
pub async fn collect<P, D>(
    page: &P,
    downloader: &D,
    pager: &PagerConfig,
    request: &SearchRequest,
    cutoff: NaiveDate,
) -> Result<PagerRun, PipelineError>
where
    P: SearchPage,
    D: ImageDownloader,
{
    ResultPager::new(pager.clone())
        .run(page, downloader, request.phrase(), cutoff)
        .await
}

/// Whether every outcome succeeded.
pub fn all_done(outcomes: &[WorkItemOutcome]) -> bool {
    outcomes.iter().all(WorkItemOutcome::is_done)
}
