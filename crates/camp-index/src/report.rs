//! Per-item outcomes of rebuilds and refreshes

use serde::Serialize;

use crate::model::ProjectEntry;

/// Something a rebuild could not index, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_table_id: Option<String>,
    pub reason: String,
}

impl Skip {
    pub fn project(project_id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            project_id,
            card_table_id: None,
            reason: reason.into(),
        }
    }

    pub fn card_table(project_id: &str, card_table_id: &str, reason: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.to_string()),
            card_table_id: Some(card_table_id.to_string()),
            reason: reason.into(),
        }
    }

    /// True when only a card table was lost and its project was still indexed
    pub fn is_card_table(&self) -> bool {
        self.card_table_id.is_some()
    }
}

/// What a rebuild indexed for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOutcome {
    pub project_id: String,
    pub name: String,
    pub card_tables: usize,
    pub columns: usize,
}

/// Result of a full rebuild: one outcome per indexed project plus totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub last_full_update: String,
    pub projects: usize,
    pub card_tables: usize,
    pub columns: usize,
    pub outcomes: Vec<ProjectOutcome>,
    pub skipped: Vec<Skip>,
}

impl RebuildReport {
    pub(crate) fn record(&mut self, entry: &ProjectEntry) {
        let outcome = ProjectOutcome {
            project_id: entry.id.clone(),
            name: entry.name.clone(),
            card_tables: entry.card_tables.len(),
            columns: entry.column_count(),
        };
        self.projects += 1;
        self.card_tables += outcome.card_tables;
        self.columns += outcome.columns;
        self.outcomes.push(outcome);
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "Index built: {} projects, {} card tables, {} columns",
            self.projects, self.card_tables, self.columns
        );
        if !self.skipped.is_empty() {
            text.push_str(&format!(" ({} skipped)", self.skipped.len()));
        }
        text
    }
}

/// Result of refreshing a single project.
///
/// `Failed` means the index was left untouched for this project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(ProjectEntry),
    Failed { project_id: String, reason: String },
}

impl RefreshOutcome {
    pub fn entry(&self) -> Option<&ProjectEntry> {
        match self {
            Self::Refreshed(entry) => Some(entry),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_entry(self) -> Option<ProjectEntry> {
        match self {
            Self::Refreshed(entry) => Some(entry),
            Self::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{project, table};

    #[test]
    fn test_summary_mentions_skips() {
        let mut report = RebuildReport::default();
        report.record(&project("1", "A", vec![table("t", &["x", "y"])]));
        assert_eq!(report.summary(), "Index built: 1 projects, 1 card tables, 2 columns");
        assert_eq!(report.outcomes[0].project_id, "1");
        assert_eq!(report.outcomes[0].columns, 2);

        report.skipped.push(Skip::card_table("1", "9", "HTTP 500"));
        assert!(report.summary().ends_with("(1 skipped)"));
        assert!(report.skipped[0].is_card_table());
    }
}
