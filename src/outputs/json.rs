//! Work-item acknowledgements as JSON.
//!
//! After a run, `work_items.json` lists every item in intake order with either
//! `"status": "done"` and its record count, or `"status": "failed"` with a
//! code and message.

use crate::models::WorkItemOutcome;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const LEDGER_FILE: &str = "work_items.json";

/// Write the outcomes of a run to `<output_dir>/work_items.json`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_outcomes(
    outcomes: &[WorkItemOutcome],
    output_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(outcomes)?;
    let path = output_dir.join(LEDGER_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), items = outcomes.len(), "Wrote work-item ledger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::OutcomeStatus;

    #[tokio::test]
    async fn test_write_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            WorkItemOutcome {
                item: 0,
                topic: Some("automation".into()),
                status: OutcomeStatus::Done { records: 4, pages: 2 },
            },
            WorkItemOutcome {
                item: 1,
                topic: Some("tacos".into()),
                status: OutcomeStatus::Failed {
                    code: ErrorCode::InvalidCategory,
                    message: "category \"Unknown\" is not one of the accepted categories".into(),
                },
            },
        ];

        write_outcomes(&outcomes, dir.path()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(LEDGER_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed[0]["status"], "done");
        assert_eq!(parsed[0]["records"], 4);
        assert_eq!(parsed[1]["code"], "INVALID_CATEGORY");
        assert_eq!(parsed[1]["item"], 1);
    }
}
