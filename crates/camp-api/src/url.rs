//! Basecamp web URL parsing

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    Card,
    Todo,
    Project,
    Column,
}

/// Identifiers extracted from a Basecamp web URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUrl {
    #[serde(rename = "type")]
    pub kind: UrlKind,
    pub account_id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
}

fn patterns() -> &'static [(UrlKind, Regex)] {
    static PATTERNS: OnceLock<Vec<(UrlKind, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (UrlKind::Card, r"basecamp\.com/(\d+)/buckets/(\d+)/card_tables/cards/(\d+)"),
            (UrlKind::Todo, r"basecamp\.com/(\d+)/buckets/(\d+)/todos/(\d+)"),
            (UrlKind::Project, r"basecamp\.com/(\d+)/projects/(\d+)"),
            (UrlKind::Column, r"basecamp\.com/(\d+)/buckets/(\d+)/card_tables/columns/(\d+)"),
        ]
        .into_iter()
        .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (kind, re)))
        .collect()
    })
}

/// Recognise card, todo, project and column URLs, in that order
pub fn parse_url(url: &str) -> Option<ParsedUrl> {
    patterns().iter().find_map(|(kind, re)| {
        let caps = re.captures(url)?;
        Some(ParsedUrl {
            kind: *kind,
            account_id: caps.get(1)?.as_str().to_string(),
            project_id: caps.get(2)?.as_str().to_string(),
            recording_id: caps.get(3).map(|m| m.as_str().to_string()),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_url() {
        let parsed =
            parse_url("https://3.basecamp.com/5798509/buckets/37594834/card_tables/cards/9010883489")
                .unwrap();
        assert_eq!(parsed.kind, UrlKind::Card);
        assert_eq!(parsed.account_id, "5798509");
        assert_eq!(parsed.project_id, "37594834");
        assert_eq!(parsed.recording_id.as_deref(), Some("9010883489"));
    }

    #[test]
    fn test_parse_todo_url() {
        let parsed = parse_url("https://3.basecamp.com/1/buckets/2/todos/3").unwrap();
        assert_eq!(parsed.kind, UrlKind::Todo);
        assert_eq!(parsed.recording_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_parse_project_url_has_no_recording() {
        let parsed = parse_url("https://3.basecamp.com/1/projects/22").unwrap();
        assert_eq!(parsed.kind, UrlKind::Project);
        assert_eq!(parsed.project_id, "22");
        assert_eq!(parsed.recording_id, None);
    }

    #[test]
    fn test_parse_column_url() {
        let parsed = parse_url("https://3.basecamp.com/1/buckets/2/card_tables/columns/77").unwrap();
        assert_eq!(parsed.kind, UrlKind::Column);
        assert_eq!(parsed.recording_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_rejects_foreign_urls() {
        assert_eq!(parse_url("https://example.com/1/projects/2"), None);
        assert_eq!(parse_url("not a url"), None);
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let parsed = parse_url("https://3.basecamp.com/1/projects/22").unwrap();
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["type"], "project");
        assert_eq!(value["accountId"], "1");
        assert!(value.get("recordingId").is_none());
    }
}
