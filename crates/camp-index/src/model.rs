//! Index data model and pure queries

use std::path::PathBuf;

use camp_api::ProjectStatus;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written to every index file
pub const INDEX_VERSION: &str = "1.0.0";

/// Current time as an ISO-8601 UTC timestamp with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A lane in a card table. `position` is the zero-based rank in the order the
/// remote returned the columns at the last refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTable {
    pub id: String,
    pub title: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub card_tables: Vec<CardTable>,
    pub last_updated: String,
}

impl ProjectEntry {
    pub fn column_count(&self) -> usize {
        self.card_tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Columns of every table, tables in stored order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.card_tables.iter().flat_map(|t| t.columns.iter())
    }
}

/// The persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub version: String,
    pub last_full_update: String,
    pub projects: Vec<ProjectEntry>,
}

impl Default for Index {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index {
    pub fn empty() -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            last_full_update: now_timestamp(),
            projects: Vec::new(),
        }
    }

    pub fn get(&self, project_id: &str) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    /// Replace the entry with the same id in place, or append it.
    /// Returns true when an existing entry was replaced.
    pub fn upsert(&mut self, entry: ProjectEntry) -> bool {
        match self.projects.iter_mut().find(|p| p.id == entry.id) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.projects.push(entry);
                false
            }
        }
    }

    /// Case-insensitive substring match on project names, in storage order
    pub fn search(&self, query: &str) -> Vec<&ProjectEntry> {
        let needle = query.to_lowercase();
        self.projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// First column whose title contains `column_name`, case-insensitively.
    /// Earlier tables win over later ones, lower positions over higher ones.
    pub fn find_column(&self, project_id: &str, column_name: &str) -> Option<&Column> {
        let needle = column_name.to_lowercase();
        self.get(project_id)?
            .columns()
            .find(|c| c.title.to_lowercase().contains(&needle))
    }

    pub fn project_columns(&self, project_id: &str) -> Vec<&Column> {
        self.get(project_id)
            .map(|p| p.columns().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self, index_path: PathBuf) -> IndexStats {
        IndexStats {
            version: self.version.clone(),
            last_full_update: self.last_full_update.clone(),
            total_projects: self.projects.len(),
            total_card_tables: self.projects.iter().map(|p| p.card_tables.len()).sum(),
            total_columns: self.projects.iter().map(ProjectEntry::column_count).sum(),
            index_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub version: String,
    pub last_full_update: String,
    pub total_projects: usize,
    pub total_card_tables: usize,
    pub total_columns: usize,
    pub index_path: PathBuf,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn table(id: &str, titles: &[&str]) -> CardTable {
        CardTable {
            id: id.to_string(),
            title: "Card Table".to_string(),
            columns: titles
                .iter()
                .enumerate()
                .map(|(position, title)| Column {
                    id: format!("{}-{}", id, position),
                    title: title.to_string(),
                    position,
                })
                .collect(),
        }
    }

    pub fn project(id: &str, name: &str, tables: Vec<CardTable>) -> ProjectEntry {
        ProjectEntry {
            id: id.to_string(),
            name: name.to_string(),
            status: ProjectStatus::Active,
            card_tables: tables,
            last_updated: now_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{project, table};
    use super::*;

    fn sample_index() -> Index {
        let mut index = Index::empty();
        index.projects = vec![
            project("1", "Project Alpha Rollout", vec![table("t1", &["Backlog", "Doing"]), table("t2", &["Doing Now"])]),
            project("2", "ALPHA-2", vec![]),
            project("3", "Beta", vec![table("t3", &["Todo"])]),
        ];
        index
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let index = sample_index();
        let names: Vec<_> = index.search("alpha").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Project Alpha Rollout", "ALPHA-2"]);
        assert!(index.search("gamma").is_empty());
        assert!(Index::empty().search("alpha").is_empty());
    }

    #[test]
    fn test_find_column_prefers_earlier_table() {
        let index = sample_index();
        let column = index.find_column("1", "doing").unwrap();
        assert_eq!(column.title, "Doing");
        assert_eq!(column.position, 1);
        assert_eq!(column.id, "t1-1");
    }

    #[test]
    fn test_find_column_unknown_project_or_title() {
        let index = sample_index();
        assert!(index.find_column("404", "doing").is_none());
        assert!(index.find_column("1", "shipped").is_none());
    }

    #[test]
    fn test_project_columns_flatten_in_order() {
        let mut index = Index::empty();
        index.projects = vec![project("9", "P", vec![table("a", &["A", "B"]), table("b", &["C"])])];

        let titles: Vec<_> = index.project_columns("9").iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert!(index.project_columns("missing").is_empty());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut index = sample_index();
        let replaced = index.upsert(project("2", "ALPHA-2 renamed", vec![]));
        assert!(replaced);
        assert_eq!(index.projects.len(), 3);
        assert_eq!(index.projects[1].name, "ALPHA-2 renamed");

        assert!(!index.upsert(project("4", "Gamma", vec![])));
        assert_eq!(index.projects.last().unwrap().id, "4");
    }

    #[test]
    fn test_stats_counts() {
        let stats = sample_index().stats(PathBuf::from("/tmp/index.json"));
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.total_card_tables, 3);
        assert_eq!(stats.total_columns, 4);
        assert_eq!(stats.version, INDEX_VERSION);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut index = Index::empty();
        index.projects = vec![project("1", "A", vec![table("t", &["X"])])];
        let value = serde_json::to_value(&index).unwrap();

        assert!(value.get("lastFullUpdate").is_some());
        let entry = &value["projects"][0];
        assert_eq!(entry["status"], "active");
        assert!(entry.get("cardTables").is_some());
        assert!(entry.get("lastUpdated").is_some());
        assert_eq!(entry["cardTables"][0]["columns"][0]["position"], 0);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
