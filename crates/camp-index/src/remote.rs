//! Reading the parts of Basecamp payloads the index cares about
//!
//! Payloads are read leniently: missing `dock` or `lists` arrays count as
//! empty, missing titles fall back to placeholders.

use std::collections::HashSet;
use std::sync::OnceLock;

use camp_api::ProjectStatus;
use regex::Regex;
use serde_json::Value;

use crate::model::Column;

/// Dock entries with this name point at card tables
pub const KANBAN_DOCK_NAME: &str = "kanban_board";

/// Title used for a card table whose dock entry has none
pub const DEFAULT_TABLE_TITLE: &str = "Card Table";

/// Project fields read from a listing or project payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProject {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub card_tables: Vec<CardTableRef>,
}

/// A card table advertised in a project's dock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTableRef {
    pub id: String,
    pub title: String,
}

/// Ids arrive as JSON numbers but are stored as strings
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn card_table_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"card_tables/(\d+)\.json").expect("static pattern"))
}

/// Extract the card table id from a dock url such as
/// `https://3.basecampapi.com/1/buckets/2/card_tables/3.json`
pub fn card_table_id_from_url(url: &str) -> Option<String> {
    card_table_url_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl RemoteProject {
    /// None when the payload carries no usable id
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = id_string(value.get("id")?)?;
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(ProjectStatus::parse)
            .unwrap_or_default();

        Some(Self {
            id,
            name,
            status,
            card_tables: card_tables_in_dock(value),
        })
    }
}

/// Kanban dock entries with a recognisable url, first occurrence of each id
fn card_tables_in_dock(project: &Value) -> Vec<CardTableRef> {
    let Some(dock) = project.get("dock").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    dock.iter()
        .filter(|item| item.get("name").and_then(Value::as_str) == Some(KANBAN_DOCK_NAME))
        .filter_map(|item| {
            let url = item.get("url").and_then(Value::as_str)?;
            let id = card_table_id_from_url(url)?;
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TABLE_TITLE)
                .to_string();
            Some(CardTableRef { id, title })
        })
        .filter(|table| seen.insert(table.id.clone()))
        .collect()
}

/// Columns of a card table payload in the order returned, ranked from 0.
/// Entries without an id and repeated ids are dropped before ranking.
pub fn columns_from_card_table(card_table: &Value) -> Vec<Column> {
    let Some(lists) = card_table.get("lists").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    lists
        .iter()
        .filter_map(|list| {
            let id = id_string(list.get("id")?)?;
            let title = list
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((id, title))
        })
        .filter(|(id, _)| seen.insert(id.clone()))
        .enumerate()
        .map(|(position, (id, title))| Column { id, title, position })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_table_id_from_url() {
        assert_eq!(
            card_table_id_from_url("https://3.basecampapi.com/1/buckets/2/card_tables/345.json").as_deref(),
            Some("345")
        );
        assert_eq!(card_table_id_from_url("https://3.basecampapi.com/1/buckets/2/todosets/3.json"), None);
    }

    #[test]
    fn test_project_from_listing() {
        let value = json!({
            "id": 37594834,
            "name": "Website",
            "status": "archived",
            "dock": [
                { "name": "message_board", "title": "Message Board", "url": "https://x/1/buckets/2/message_boards/9.json" },
                { "name": "kanban_board", "title": "Bugs", "url": "https://x/1/buckets/2/card_tables/10.json" },
                { "name": "kanban_board", "url": "https://x/1/buckets/2/card_tables/11.json" },
                { "name": "kanban_board", "title": "Broken", "url": "https://x/1/buckets/2/elsewhere" },
                { "name": "kanban_board", "title": "Dup", "url": "https://x/1/buckets/2/card_tables/10.json" }
            ]
        });

        let project = RemoteProject::from_value(&value).unwrap();
        assert_eq!(project.id, "37594834");
        assert_eq!(project.status, ProjectStatus::Archived);
        assert_eq!(
            project.card_tables,
            vec![
                CardTableRef { id: "10".to_string(), title: "Bugs".to_string() },
                CardTableRef { id: "11".to_string(), title: DEFAULT_TABLE_TITLE.to_string() },
            ]
        );
    }

    #[test]
    fn test_project_without_dock_or_id() {
        let project = RemoteProject::from_value(&json!({ "id": "5", "name": "Bare" })).unwrap();
        assert!(project.card_tables.is_empty());
        assert_eq!(project.status, ProjectStatus::Active);

        assert_eq!(RemoteProject::from_value(&json!({ "name": "No id" })), None);
        assert_eq!(RemoteProject::from_value(&json!({})), None);
    }

    #[test]
    fn test_columns_are_ranked_in_remote_order() {
        let table = json!({
            "lists": [
                { "id": 3, "title": "Triage" },
                { "title": "No id" },
                { "id": 1, "title": "In Progress" },
                { "id": 3, "title": "Triage again" },
                { "id": "2", "title": "Done" }
            ]
        });

        let columns = columns_from_card_table(&table);
        let summary: Vec<_> = columns
            .iter()
            .map(|c| (c.id.as_str(), c.title.as_str(), c.position))
            .collect();
        assert_eq!(
            summary,
            vec![("3", "Triage", 0), ("1", "In Progress", 1), ("2", "Done", 2)]
        );
    }

    #[test]
    fn test_missing_lists_is_empty() {
        assert!(columns_from_card_table(&json!({})).is_empty());
        assert!(columns_from_card_table(&json!({ "lists": null })).is_empty());
    }
}
