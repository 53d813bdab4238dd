//! Data models for search requests, scraped records, and work-item outcomes.
//!
//! This module defines the data structures passed between the pipeline stages:
//! - [`Category`]: The fixed set of site sections a search can be filtered by
//! - [`NewsRecord`]: One structured row extracted from a result card
//! - [`ReportTable`]: The ordered rows that end up in the workbook
//! - [`WorkItemPayload`]: The loosely typed intake shape, before validation
//! - [`WorkItemOutcome`]: The per-item acknowledgement written after a run

use crate::errors::ErrorCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A site section used to narrow search results.
///
/// The labels are matched exactly against the payload's `category` value and
/// against the text of the site's filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    WorldNation,
    Politics,
    Business,
    California,
    EntertainmentArts,
    Sports,
    Opinion,
    ScienceMedicine,
    ClimateEnvironment,
    Technology,
    Food,
}

impl Category {
    /// Every accepted category, in the order the site lists them.
    pub const ALL: [Category; 11] = [
        Category::WorldNation,
        Category::Politics,
        Category::Business,
        Category::California,
        Category::EntertainmentArts,
        Category::Sports,
        Category::Opinion,
        Category::ScienceMedicine,
        Category::ClimateEnvironment,
        Category::Technology,
        Category::Food,
    ];

    /// The literal label used in payloads and on the site.
    pub fn label(self) -> &'static str {
        match self {
            Category::WorldNation => "World & Nation",
            Category::Politics => "Politics",
            Category::Business => "Business",
            Category::California => "California",
            Category::EntertainmentArts => "Entertainment & Arts",
            Category::Sports => "Sports",
            Category::Opinion => "Opinion",
            Category::ScienceMedicine => "Science & Medicine",
            Category::ClimateEnvironment => "Climate & Environment",
            Category::Technology => "Technology",
            Category::Food => "Food",
        }
    }

    /// Look up a category by its exact label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One structured row extracted from a search result card.
///
/// `phrase_count` and `contains_money` are always derived from `title`;
/// see [`crate::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRecord {
    /// Headline, taken from the second line of the card text.
    pub title: String,
    /// Publication date shown on the card, if the card carried one.
    pub published: Option<NaiveDate>,
    /// Always empty; kept so the report layout stays stable.
    pub description: String,
    /// Where the thumbnail was saved. `None` when it could not be fetched.
    pub image_path: Option<PathBuf>,
    /// Case-insensitive occurrences of the search phrase in the title.
    pub phrase_count: usize,
    /// Whether the title mentions an amount of money.
    pub contains_money: bool,
}

impl NewsRecord {
    /// The image path as written to the report; blank when no image was saved.
    pub fn picture_filename(&self) -> String {
        self.image_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

/// Records in traversal order: page order, then position on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    records: Vec<NewsRecord>,
}

impl ReportTable {
    /// Fixed header row of the workbook.
    pub const HEADER: [&'static str; 6] = [
        "title",
        "date",
        "description",
        "picture filename",
        "count of search phrases",
        "contains money",
    ];

    pub fn push(&mut self, record: NewsRecord) {
        self.records.push(record);
    }

    /// Append every record of `other`, keeping its order.
    pub fn append(&mut self, other: ReportTable) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[NewsRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The `months` field as it arrives: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MonthsValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for MonthsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthsValue::Number(n) => write!(f, "{n}"),
            MonthsValue::Text(s) => f.write_str(s),
        }
    }
}

/// A work item exactly as delivered, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkItemPayload {
    pub topic: Option<String>,
    pub category: Option<String>,
    pub months: Option<MonthsValue>,
}

/// Contents of a work-items file: a list of payloads or a single one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WorkItemsFile {
    Many(Vec<WorkItemPayload>),
    One(WorkItemPayload),
}

impl WorkItemsFile {
    pub fn into_payloads(self) -> Vec<WorkItemPayload> {
        match self {
            WorkItemsFile::Many(items) => items,
            WorkItemsFile::One(item) => vec![item],
        }
    }
}

/// Acknowledgement for one processed work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItemOutcome {
    /// Zero-based position of the item in the intake.
    pub item: usize,
    pub topic: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Done { records: usize, pages: u32 },
    Failed { code: ErrorCode, message: String },
}

impl WorkItemOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self.status, OutcomeStatus::Done { .. })
    }
}
