//! Page-by-page traversal of search results with a date cutoff.
//!
//! The pager is a small state machine:
//!
//! ```text
//! FetchingPage ──▶ ProcessingItems ──▶ Continue ──▶ FetchingPage ...
//!                        │
//!                        └──▶ Stop(CutoffReached | LastPage)
//! ```
//!
//! Results are assumed to be sorted newest first, so the first card dated
//! before the cutoff ends the whole traversal, even in the middle of a page.
//! Cards before it on the same page are kept; it and everything after are
//! dropped without fetching their images. Cards with no date never stop the
//! traversal.

use crate::errors::PipelineError;
use crate::extract::{self, ExtractError};
use crate::images::{self, ImageDownloader, ImageError};
use crate::models::ReportTable;
use crate::retry::RetryPolicy;
use crate::site::SearchPage;
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use rand::{rng, Rng};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// What to do with a card whose date token does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedDatePolicy {
    /// Fail the work item.
    #[default]
    Abort,
    /// Log, count, and move on to the next card.
    Skip,
}

/// What to do when a card's image cannot be resolved or downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingImagePolicy {
    /// Keep the record with a blank picture filename.
    #[default]
    BlankPath,
    /// Fail the work item.
    Abort,
}

/// Inclusive range the pause between pages is drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn pick(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rng().random_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(10))
    }
}

#[derive(Debug, Clone)]
pub struct PagerConfig {
    pub delay: DelayRange,
    pub retry: RetryPolicy,
    pub on_malformed_date: MalformedDatePolicy,
    pub on_missing_image: MissingImagePolicy,
    pub images_dir: PathBuf,
}

impl PagerConfig {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            delay: DelayRange::default(),
            retry: RetryPolicy::default(),
            on_malformed_date: MalformedDatePolicy::default(),
            on_missing_image: MissingImagePolicy::default(),
            images_dir: images_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A card older than the cutoff was reached.
    CutoffReached,
    /// The next-page control was missing or disabled.
    LastPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    FetchingPage,
    ProcessingItems,
    Continue,
    Stop(StopReason),
}

/// Everything one traversal produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PagerRun {
    pub table: ReportTable,
    pub pages: u32,
    pub stop: StopReason,
    /// Cards skipped for an unparseable date.
    pub skipped_cards: u32,
    /// Records kept without an image.
    pub missing_images: u32,
}

pub struct ResultPager {
    config: PagerConfig,
}

impl ResultPager {
    pub fn new(config: PagerConfig) -> Self {
        Self { config }
    }

    /// Walk result pages until the cutoff or the last page.
    ///
    /// # Errors
    ///
    /// Page interaction failures, a malformed date under
    /// [`MalformedDatePolicy::Abort`], or an image failure under
    /// [`MissingImagePolicy::Abort`].
    #[instrument(level = "info", skip_all, fields(%phrase, %cutoff))]
    pub async fn run<P, D>(
        &self,
        page: &P,
        downloader: &D,
        phrase: &str,
        cutoff: NaiveDate,
    ) -> Result<PagerRun, PipelineError>
    where
        P: SearchPage,
        D: ImageDownloader,
    {
        let mut table = ReportTable::default();
        let mut pages = 0u32;
        let mut skipped_cards = 0u32;
        let mut missing_images = 0u32;
        let mut cards = Vec::new();
        let mut state = PagerState::FetchingPage;

        let stop = loop {
            state = match state {
                PagerState::FetchingPage => {
                    cards = page.cards().await?;
                    pages += 1;
                    info!(page = pages, cards = cards.len(), "Fetched result page");
                    PagerState::ProcessingItems
                }
                PagerState::ProcessingItems => {
                    let mut cutoff_hit = false;
                    for (index, card) in cards.iter().enumerate() {
                        let text = page.card_text(card).await?;
                        let mut record = match extract::extract(&text, phrase) {
                            Ok(Some(record)) if record.published.is_some_and(|d| d < cutoff) => {
                                info!(
                                    page = pages,
                                    card = index,
                                    published = ?record.published,
                                    "Card older than cutoff; stopping"
                                );
                                cutoff_hit = true;
                                break;
                            }
                            Ok(Some(record)) => record,
                            Ok(None) => {
                                debug!(page = pages, card = index, "Card has no date");
                                extract::undated(&text, phrase)
                            }
                            Err(e) => {
                                self.on_malformed_date(e, pages, index, &text)?;
                                skipped_cards += 1;
                                continue;
                            }
                        };

                        match self.fetch_image(page, downloader, card).await {
                            Ok(path) => record.image_path = Some(path),
                            Err(e) => match self.config.on_missing_image {
                                MissingImagePolicy::Abort => return Err(e.into()),
                                MissingImagePolicy::BlankPath => {
                                    warn!(page = pages, card = index, error = %e, "Keeping record without image");
                                    missing_images += 1;
                                }
                            },
                        }
                        debug!(page = pages, card = index, title = %record.title, "Appended record");
                        table.push(record);
                    }

                    if cutoff_hit {
                        PagerState::Stop(StopReason::CutoffReached)
                    } else if page.has_next_page().await? {
                        PagerState::Continue
                    } else {
                        PagerState::Stop(StopReason::LastPage)
                    }
                }
                PagerState::Continue => {
                    page.next_page().await?;
                    let delay = self.config.delay.pick();
                    debug!(?delay, "Pausing before next page");
                    sleep(delay).await;
                    PagerState::FetchingPage
                }
                PagerState::Stop(reason) => break reason,
            };
        };

        info!(
            pages,
            records = table.len(),
            skipped_cards,
            missing_images,
            ?stop,
            "Pagination finished"
        );
        if table.is_empty() {
            warn!(pages, "No records collected for this search");
        }
        Ok(PagerRun {
            table,
            pages,
            stop,
            skipped_cards,
            missing_images,
        })
    }

    fn on_malformed_date(
        &self,
        error: ExtractError,
        page: u32,
        card: usize,
        text: &str,
    ) -> Result<(), ExtractError> {
        match self.config.on_malformed_date {
            MalformedDatePolicy::Abort => Err(error),
            MalformedDatePolicy::Skip => {
                warn!(
                    page,
                    card,
                    error = %error,
                    text = %truncate_for_log(text, 120),
                    "Skipping card with unparseable date"
                );
                Ok(())
            }
        }
    }

    async fn fetch_image<P, D>(
        &self,
        page: &P,
        downloader: &D,
        card: &P::Card,
    ) -> Result<PathBuf, ImageError>
    where
        P: SearchPage,
        D: ImageDownloader,
    {
        let url = images::resolve_image_url(page, card, &self.config.retry).await?;
        let dest = images::local_path(&url, &self.config.images_dir)?;
        downloader.download(&url, &dest).await?;
        Ok(dest)
    }
}
