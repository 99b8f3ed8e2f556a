//! Administrative column removal for survey exports.
//!
//! Survey platforms prepend bookkeeping columns (timestamps, respondent
//! identity, geolocation) that carry no answers. They are removed in
//! groups, each group confirmed by the operator.

use crate::error::PromptResult;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::Table;
use crate::session::Prompter;

/// Response bookkeeping columns.
pub const RESPONSE_METADATA: &[&str] = &[
    "StartDate",
    "EndDate",
    "Status",
    "IPAddress",
    "Progress",
    "Duration (in seconds)",
];

/// Respondent identity and distribution columns.
pub const RESPONDENT_METADATA: &[&str] = &[
    "RecordedDate",
    "ResponseId",
    "RecipientLastName",
    "RecipientFirstName",
    "RecipientEmail",
    "ExternalReference",
    "LocationLatitude",
    "LocationLongitude",
    "DistributionChannel",
    "UserLanguage",
];

/// Default groups, in the order they are offered.
pub fn default_groups() -> Vec<Vec<String>> {
    [RESPONSE_METADATA, RESPONDENT_METADATA]
        .iter()
        .map(|group| group.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// Result of a strip pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    /// Columns removed, in table order per group
    pub removed: Vec<String>,
    /// Columns present but kept because the operator declined
    pub kept: Vec<String>,
}

/// Remove column groups from a table.
///
/// For each group only the columns present in the table are considered.
/// Unless `assume_yes` is set the operator confirms each non-empty group.
/// A group covering every remaining column is kept, so the row count
/// never changes.
pub fn strip_columns<P: Prompter>(
    table: &mut Table,
    groups: &[Vec<String>],
    prompter: &mut P,
    assume_yes: bool,
) -> PromptResult<StripReport> {
    let mut report = StripReport::default();

    for group in groups {
        let existing: Vec<&str> = group
            .iter()
            .map(String::as_str)
            .filter(|name| table.has_column(name))
            .collect();

        if existing.is_empty() {
            continue;
        }

        let listed = existing.join(", ");

        // A table without columns has no rows left to keep
        if existing.len() == table.width() {
            log_warning(format!(
                "Not deleting {}: no columns would remain",
                listed
            ));
            report.kept.extend(existing.iter().map(|c| c.to_string()));
            continue;
        }

        let approved = assume_yes
            || prompter.confirm(&format!("Do you want to delete the columns: {}?", listed))?;

        if approved {
            let removed = table.drop_columns(&existing);
            log_success(format!("Columns {} deleted", removed.join(", ")));
            report.removed.extend(removed);
        } else {
            log_info(format!("Skipping deletion of columns: {}", listed));
            report.kept.extend(existing.iter().map(|c| c.to_string()));
        }
    }

    Ok(report)
}
