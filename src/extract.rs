//! Result-card parsing.
//!
//! A card's rendered text looks like:
//!
//! ```text
//! Jun 5, 2024
//! Automation saves $1,200 for firms
//! Teaser paragraph...
//! ```
//!
//! The date token can appear anywhere in the text. The title is always taken
//! from the second line, which breaks if the site reorders the card layout.

use crate::models::NewsRecord;
use chrono::{Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+) (\d{1,2}), (\d{4})").expect("date pattern compiles"));

static MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\d+(?:,\d{3})*(?:\.\d{1,2})?|\d+ dollars|\d+ USD").expect("money pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A date-shaped token was found but is not a real calendar date.
    #[error("unparseable publication date {token:?}: {reason}")]
    MalformedDate { token: String, reason: String },
}

/// Extract a dated record from a card.
///
/// Returns `Ok(None)` when the card has no date token at all (ads, promo
/// tiles), and [`ExtractError::MalformedDate`] when it has one that does not
/// parse. Month names may be full (`June`) or abbreviated (`Jun`).
pub fn extract(card_text: &str, phrase: &str) -> Result<Option<NewsRecord>, ExtractError> {
    let Some(caps) = DATE_TOKEN.captures(card_text) else {
        return Ok(None);
    };
    let published = parse_date(&caps)?;

    let mut record = undated(card_text, phrase);
    record.published = Some(published);
    Ok(Some(record))
}

/// Build a record for a card without a date.
pub fn undated(card_text: &str, phrase: &str) -> NewsRecord {
    let title = card_text.lines().nth(1).unwrap_or_default().trim().to_string();
    NewsRecord {
        phrase_count: count_phrase(&title, phrase),
        contains_money: mentions_money(&title),
        title,
        published: None,
        description: String::new(),
        image_path: None,
    }
}

/// Non-overlapping, case-insensitive occurrences of `phrase` in `title`.
pub fn count_phrase(title: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    title
        .to_lowercase()
        .matches(phrase.to_lowercase().as_str())
        .count()
}

/// `$1,200.50`, `$40`, `15 dollars` or `300 USD`.
pub fn mentions_money(title: &str) -> bool {
    MONEY.is_match(title)
}

fn parse_date(caps: &Captures<'_>) -> Result<NaiveDate, ExtractError> {
    let malformed = |reason: &str| ExtractError::MalformedDate {
        token: caps[0].to_string(),
        reason: reason.to_string(),
    };

    let month = caps[1]
        .parse::<Month>()
        .map_err(|_| malformed("unknown month name"))?;
    let day: u32 = caps[2].parse().map_err(|_| malformed("bad day"))?;
    let year: i32 = caps[3].parse().map_err(|_| malformed("bad year"))?;

    NaiveDate::from_ymd_opt(year, month.number_from_month(), day)
        .ok_or_else(|| malformed("day out of range for month"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dated_card() {
        let text = "Jun 5, 2024\nAutomation saves $1,200 for firms\nlorem";
        let record = extract(text, "automation").unwrap().unwrap();
        assert_eq!(record.title, "Automation saves $1,200 for firms");
        assert_eq!(record.published, Some(date(2024, 6, 5)));
        assert_eq!(record.phrase_count, 1);
        assert!(record.contains_money);
        assert_eq!(record.description, "");
        assert_eq!(record.image_path, None);
    }

    #[test]
    fn test_full_month_name_and_date_mid_text() {
        let text = "BUSINESS\nMarkets rally again\nUpdated September 12, 2023 at 4 PM";
        let record = extract(text, "markets").unwrap().unwrap();
        assert_eq!(record.published, Some(date(2023, 9, 12)));
        assert_eq!(record.title, "Markets rally again");
    }

    #[test]
    fn test_card_without_date_is_absent() {
        assert_eq!(extract("Sponsored\nBuy our thing\n", "thing"), Ok(None));
        assert_eq!(extract("", "thing"), Ok(None));
    }

    #[test]
    fn test_malformed_date_is_distinct_error() {
        let err = extract("Smarch 5, 2024\nTitle", "title").unwrap_err();
        let ExtractError::MalformedDate { token, .. } = err;
        assert_eq!(token, "Smarch 5, 2024");

        assert!(extract("Feb 30, 2024\nTitle", "title").is_err());
    }

    #[test]
    fn test_title_missing_second_line() {
        let record = extract("Jun 5, 2024", "anything").unwrap().unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.phrase_count, 0);
        assert!(!record.contains_money);
    }

    #[test]
    fn test_undated_record_keeps_title_rules() {
        let record = undated("Promo\nWin 500 dollars today", "win");
        assert_eq!(record.published, None);
        assert_eq!(record.title, "Win 500 dollars today");
        assert_eq!(record.phrase_count, 1);
        assert!(record.contains_money);
    }

    #[test]
    fn test_phrase_count_is_case_insensitive_and_non_overlapping() {
        let title = "AI beats ai; Ai wins";
        assert_eq!(count_phrase(title, "ai"), 3);
        assert_eq!(count_phrase(title, "AI"), count_phrase(title, "ai"));
        assert_eq!(count_phrase("aaaa", "aa"), 2);
        assert_eq!(count_phrase("anything", ""), 0);
    }

    #[test]
    fn test_money_patterns() {
        assert!(mentions_money("Costs $5"));
        assert!(mentions_money("Raised $11,300,000 in seed"));
        assert!(mentions_money("Only $9.99 now"));
        assert!(mentions_money("Fined 300 dollars"));
        assert!(mentions_money("Paid 40 USD"));
        assert!(!mentions_money("Fined 300 Dollars"));
        assert!(!mentions_money("Paid 40 usd"));
        assert!(!mentions_money("No money here"));
        assert!(!mentions_money("$ alone"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let text = "May 1, 2024\nRust 2024 ships\nbody";
        assert_eq!(extract(text, "rust"), extract(text, "rust"));
    }
}
