//! Turns a raw [`WorkItemPayload`] into a [`SearchRequest`].
//!
//! [`validate`] is the only way to build a `SearchRequest`, so nothing past
//! this module ever sees a partially valid request. Checks run in a fixed
//! order and stop at the first failure: missing keys, category, topic length,
//! months.

use crate::errors::ErrorCode;
use crate::models::{Category, MonthsValue, WorkItemPayload};
use thiserror::Error;
use tracing::debug;

/// Topics must be strictly shorter than this many characters.
pub const MAX_TOPIC_CHARS: usize = 100;

/// Longest accepted lookback, in months.
pub const MAX_MONTHS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
    #[error("category {0:?} is not one of the accepted categories")]
    InvalidCategory(String),
    #[error("topic must be between 1 and {max} characters, got {len}", max = MAX_TOPIC_CHARS - 1)]
    InvalidTopicLength { len: usize },
    #[error("months must be an integer from 0 to {max}, got {0:?}", max = MAX_MONTHS)]
    InvalidMonthsValue(String),
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::MissingKeys(_) => ErrorCode::MissingKeys,
            ValidationError::InvalidCategory(_) => ErrorCode::InvalidCategory,
            ValidationError::InvalidTopicLength { .. } => ErrorCode::InvalidTopicLength,
            ValidationError::InvalidMonthsValue(_) => ErrorCode::InvalidMonthsValue,
        }
    }
}

/// A validated search: phrase, site section, and lookback in months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    phrase: String,
    category: Category,
    months: u32,
}

impl SearchRequest {
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn months(&self) -> u32 {
        self.months
    }
}

/// Validate a payload.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in check order.
pub fn validate(payload: &WorkItemPayload) -> Result<SearchRequest, ValidationError> {
    let missing: Vec<&'static str> = [
        ("topic", payload.topic.is_none()),
        ("category", payload.category.is_none()),
        ("months", payload.months.is_none()),
    ]
    .into_iter()
    .filter_map(|(key, absent)| absent.then_some(key))
    .collect();

    let (Some(topic), Some(category), Some(months)) =
        (&payload.topic, &payload.category, &payload.months)
    else {
        return Err(ValidationError::MissingKeys(missing));
    };

    let category = Category::from_label(category)
        .ok_or_else(|| ValidationError::InvalidCategory(category.clone()))?;

    let phrase = topic.trim();
    let len = phrase.chars().count();
    if len == 0 || len >= MAX_TOPIC_CHARS {
        return Err(ValidationError::InvalidTopicLength { len });
    }

    let months = parse_months(months)?;

    debug!(%phrase, %category, months, "Validated work item");
    Ok(SearchRequest {
        phrase: phrase.to_string(),
        category,
        months,
    })
}

fn parse_months(value: &MonthsValue) -> Result<u32, ValidationError> {
    let parsed = match value {
        MonthsValue::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        MonthsValue::Text(s) => s.trim().parse::<u32>().ok(),
    };
    parsed
        .filter(|m| *m <= MAX_MONTHS)
        .ok_or_else(|| ValidationError::InvalidMonthsValue(value.to_string()))
}
