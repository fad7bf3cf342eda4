//! Tool Handler
//!
//! Routes tool calls to the Basecamp client or the project index and turns
//! the outcome into a [`ToolResult`].

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, bail, Context, Result};
use camp_api::{
    parse_url, ApiResponse, BasecampClient, CardUpdate, NewCard, NewTodo, ProjectStatus, TodoUpdate,
    UrlKind,
};
use camp_index::{IndexManager, RefreshOutcome};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::protocol::ToolResult;

/// Events returned by `basecamp_get_events` when no limit is given
pub const DEFAULT_EVENT_LIMIT: usize = 20;

/// Owns the API client and the project index for the server's lifetime
pub struct Router {
    client: Arc<BasecampClient>,
    index: IndexManager<Arc<BasecampClient>>,
}

impl Router {
    pub fn new(client: BasecampClient, index_path: impl Into<PathBuf>) -> Self {
        let client = Arc::new(client);
        let index = IndexManager::new(Arc::clone(&client), index_path);
        Self { client, index }
    }

    pub fn index(&self) -> &IndexManager<Arc<BasecampClient>> {
        &self.index
    }

    /// Handle a tool call. Every failure becomes an error result.
    pub async fn handle_tool(&mut self, name: &str, arguments: Map<String, Value>) -> ToolResult {
        match self.dispatch(name, &arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed: {:#}", name, e);
                ToolResult::error(format!("{:#}", e))
            }
        }
    }

    async fn dispatch(&mut self, name: &str, args: &Map<String, Value>) -> Result<ToolResult> {
        let client = Arc::clone(&self.client);
        let api = client.as_ref();

        match name {
            // =========================================================================
            // Reading & commenting
            // =========================================================================
            "basecamp_read" => {
                let url = require(args, "url")?;
                let include_comments = get_bool(args, "include_comments").unwrap_or(true);
                let include_images = get_bool(args, "include_images").unwrap_or(true);
                self.read(&url, include_comments, include_images).await
            }
            "basecamp_comment" => {
                let url = require(args, "url")?;
                let comment = require(args, "comment")?;
                let parsed = parse_url(&url).ok_or_else(|| anyhow!("Invalid Basecamp URL"))?;
                let recording_id = parsed
                    .recording_id
                    .ok_or_else(|| anyhow!("URL does not point at a card or todo"))?;

                let resp = api.create_comment(&parsed.project_id, &recording_id, &comment).await;
                if resp.code == 201 {
                    Ok(ToolResult::success("Comment posted successfully"))
                } else {
                    bail!("Failed to post comment: {}", resp.failure_message())
                }
            }

            // =========================================================================
            // Projects
            // =========================================================================
            "basecamp_list_projects" => {
                let status = match get_str(args, "status") {
                    Some(s) => ProjectStatus::parse(&s).ok_or_else(|| anyhow!("Unknown project status: {}", s))?,
                    None => ProjectStatus::Active,
                };
                pretty(&expect_data(api.get_projects(Some(status), 1).await, "Failed to list projects")?)
            }
            "basecamp_get_project" => {
                let project_id = require(args, "project_id")?;
                pretty(&expect_data(api.get_project(&project_id).await, "Failed to get project")?)
            }
            "basecamp_create_project" => {
                let name = require(args, "name")?;
                let description = get_str(args, "description").unwrap_or_default();
                let data = expect_data(
                    api.create_project(&name, &description).await,
                    "Failed to create project",
                )?;
                Ok(ToolResult::success(format!(
                    "Project created: {} (ID: {})",
                    field(&data, "name"),
                    field(&data, "id")
                )))
            }
            "basecamp_update_project" => {
                let project_id = require(args, "project_id")?;
                let name = get_str(args, "name");
                let description = get_str(args, "description");
                expect_data(
                    api.update_project(&project_id, name.as_deref(), description.as_deref()).await,
                    "Failed to update project",
                )?;
                Ok(ToolResult::success("Project updated successfully"))
            }
            "basecamp_trash_project" => {
                let project_id = require(args, "project_id")?;
                expect_data(api.trash_project(&project_id).await, "Failed to trash project")?;
                Ok(ToolResult::success("Project moved to trash"))
            }
            "basecamp_find_project" => {
                let term = require(args, "search_term")?;
                let data = expect_data(api.get_projects(None, 1).await, "Failed to fetch projects")?;
                let projects = data.as_array().context("Failed to fetch projects")?;
                let needle = term.to_lowercase();
                let matches: Vec<&Value> = projects
                    .iter()
                    .filter(|p| {
                        p.get("name")
                            .and_then(Value::as_str)
                            .is_some_and(|n| n.to_lowercase().contains(&needle))
                    })
                    .collect();
                pretty(&matches)
            }

            // =========================================================================
            // Card tables
            // =========================================================================
            "basecamp_list_columns" => {
                let project_id = require(args, "project_id")?;
                let table_id = require(args, "table_id")?;
                pretty(&expect_data(
                    api.get_columns(&project_id, &table_id, 1).await,
                    "Failed to list columns",
                )?)
            }
            "basecamp_list_cards" => {
                let project_id = require(args, "project_id")?;
                let column_id = require(args, "column_id")?;
                pretty(&expect_data(
                    api.get_cards(&project_id, &column_id, 1).await,
                    "Failed to list cards",
                )?)
            }
            "basecamp_get_card" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                pretty(&expect_data(api.get_card(&project_id, &card_id).await, "Failed to get card")?)
            }
            "basecamp_create_card" => {
                let project_id = require(args, "project_id")?;
                let column_id = require(args, "column_id")?;
                let card = NewCard {
                    title: require(args, "title")?,
                    content: get_str(args, "content").unwrap_or_default(),
                    due_on: get_str(args, "due_on"),
                    assignee_ids: get_ids(args, "assignee_ids").unwrap_or_default(),
                };
                let data = expect_data(
                    api.create_card(&project_id, &column_id, &card).await,
                    "Failed to create card",
                )?;
                Ok(ToolResult::success(format!(
                    "Card created: {} (ID: {})",
                    field(&data, "title"),
                    field(&data, "id")
                )))
            }
            "basecamp_update_card" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                let update = CardUpdate {
                    title: non_empty(args, "title"),
                    content: non_empty(args, "content"),
                    due_on: non_empty(args, "due_on"),
                    assignee_ids: get_ids(args, "assignee_ids"),
                    completed: get_bool(args, "completed"),
                };
                expect_data(
                    api.update_card(&project_id, &card_id, &update).await,
                    "Failed to update card",
                )?;
                Ok(ToolResult::success("Card updated successfully"))
            }
            "basecamp_move_card" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                let to_column = require(args, "to_column")?;
                let position = get_int(args, "position");
                expect_data(
                    api.move_card(&project_id, &card_id, &to_column, position).await,
                    "Failed to move card",
                )?;
                Ok(ToolResult::success(format!("Card moved to column {}", to_column)))
            }
            "basecamp_trash_card" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                expect_data(api.trash_card(&project_id, &card_id).await, "Failed to trash card")?;
                Ok(ToolResult::success("Card moved to trash"))
            }

            // =========================================================================
            // Card steps
            // =========================================================================
            "basecamp_list_steps" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                pretty(&expect_data(api.get_steps(&project_id, &card_id).await, "Failed to list steps")?)
            }
            "basecamp_add_step" => {
                let project_id = require(args, "project_id")?;
                let card_id = require(args, "card_id")?;
                let title = require(args, "title")?;
                expect_data(
                    api.create_step(&project_id, &card_id, &title).await,
                    "Failed to add step",
                )?;
                Ok(ToolResult::success(format!("Step added: {}", title)))
            }
            "basecamp_complete_step" => {
                let project_id = require(args, "project_id")?;
                let step_id = require(args, "step_id")?;
                expect_data(
                    api.complete_step(&project_id, &step_id).await,
                    "Failed to complete step",
                )?;
                Ok(ToolResult::success("Step marked as completed"))
            }
            "basecamp_uncomplete_step" => {
                let project_id = require(args, "project_id")?;
                let step_id = require(args, "step_id")?;
                expect_data(
                    api.uncomplete_step(&project_id, &step_id).await,
                    "Failed to uncomplete step",
                )?;
                Ok(ToolResult::success("Step marked as incomplete"))
            }

            // =========================================================================
            // People
            // =========================================================================
            "basecamp_list_people" => {
                let resp = match get_str(args, "project_id") {
                    Some(project_id) => api.get_project_people(&project_id, 1).await,
                    None => api.get_people(1).await,
                };
                pretty(&expect_data(resp, "Failed to list people")?)
            }
            "basecamp_get_person" => {
                let person_id = require(args, "person_id")?;
                pretty(&expect_data(api.get_person(&person_id).await, "Failed to get person")?)
            }

            // =========================================================================
            // Todos
            // =========================================================================
            "basecamp_get_todo" => {
                let project_id = require(args, "project_id")?;
                let todo_id = require(args, "todo_id")?;
                pretty(&expect_data(api.get_todo(&project_id, &todo_id).await, "Failed to get todo")?)
            }
            "basecamp_create_todo" => {
                let project_id = require(args, "project_id")?;
                let todolist_id = require(args, "todolist_id")?;
                let todo = NewTodo {
                    content: require(args, "content")?,
                    due_on: get_str(args, "due_on"),
                    assignee_ids: get_ids(args, "assignee_ids").unwrap_or_default(),
                };
                let data = expect_data(
                    api.create_todo(&project_id, &todolist_id, &todo).await,
                    "Failed to create todo",
                )?;
                Ok(ToolResult::success(format!("Todo created: {}", field(&data, "content"))))
            }
            "basecamp_update_todo" => {
                let project_id = require(args, "project_id")?;
                let todo_id = require(args, "todo_id")?;
                let update = TodoUpdate {
                    content: non_empty(args, "content"),
                    description: non_empty(args, "description"),
                    due_on: non_empty(args, "due_on"),
                    starts_on: non_empty(args, "starts_on"),
                    assignee_ids: get_ids(args, "assignee_ids"),
                };
                expect_data(
                    api.update_todo(&project_id, &todo_id, &update).await,
                    "Failed to update todo",
                )?;
                Ok(ToolResult::success("Todo updated successfully"))
            }
            "basecamp_complete_todo" => {
                let project_id = require(args, "project_id")?;
                let todo_id = require(args, "todo_id")?;
                expect_data(
                    api.complete_todo(&project_id, &todo_id).await,
                    "Failed to complete todo",
                )?;
                Ok(ToolResult::success("Todo marked as completed"))
            }
            "basecamp_uncomplete_todo" => {
                let project_id = require(args, "project_id")?;
                let todo_id = require(args, "todo_id")?;
                expect_data(
                    api.uncomplete_todo(&project_id, &todo_id).await,
                    "Failed to uncomplete todo",
                )?;
                Ok(ToolResult::success("Todo marked as incomplete"))
            }

            // =========================================================================
            // Activity
            // =========================================================================
            "basecamp_get_events" => {
                let limit = get_int(args, "limit")
                    .map(|n| n.max(0) as usize)
                    .unwrap_or(DEFAULT_EVENT_LIMIT);
                let resp = match get_str(args, "project_id") {
                    Some(project_id) => api.get_project_events(&project_id, 1, None).await,
                    None => api.get_events(1, None).await,
                };
                let mut events = expect_data(resp, "Failed to fetch events")?;
                if let Value::Array(items) = &mut events {
                    items.truncate(limit);
                }
                pretty(&events)
            }

            // =========================================================================
            // Project index
            // =========================================================================
            "basecamp_index_build" => {
                let report = self.index.rebuild_full().await.context("Index build failed")?;
                let details = serde_json::to_string_pretty(&report)?;
                Ok(ToolResult::success(format!("{}\n\n{}", report.summary(), details)))
            }
            "basecamp_index_update_project" => {
                let project_id = require(args, "project_id")?;
                match self.index.refresh_project(&project_id).await? {
                    RefreshOutcome::Refreshed(entry) => pretty(&entry),
                    RefreshOutcome::Failed { project_id, reason } => Ok(ToolResult::error(format!(
                        "Failed to update project {} in index: {}",
                        project_id, reason
                    ))),
                }
            }
            "basecamp_index_search" => {
                let query = require(args, "query")?;
                pretty(&self.index.search(&query))
            }
            "basecamp_index_get_project" => {
                let project_id = require(args, "project_id")?;
                match self.index.get_project(&project_id) {
                    Some(entry) => pretty(entry),
                    None => Ok(ToolResult::error(format!(
                        "Project {} not found in index",
                        project_id
                    ))),
                }
            }
            "basecamp_index_find_column" => {
                let project_id = require(args, "project_id")?;
                let column_name = require(args, "column_name")?;
                match self.index.find_column(&project_id, &column_name) {
                    Some(column) => pretty(column),
                    None => Ok(ToolResult::error(format!(
                        "No column matching '{}' in project {}",
                        column_name, project_id
                    ))),
                }
            }
            "basecamp_index_get_columns" => {
                let project_id = require(args, "project_id")?;
                pretty(&self.index.project_columns(&project_id))
            }
            "basecamp_index_stats" => pretty(&self.index.stats()),

            // =========================================================================
            // Utility
            // =========================================================================
            "basecamp_parse_url" => {
                let url = require(args, "url")?;
                let parsed = parse_url(&url).ok_or_else(|| anyhow!("Invalid Basecamp URL"))?;
                pretty(&parsed)
            }

            _ => Ok(ToolResult::error(format!("Unknown tool: {}", name))),
        }
    }

    async fn read(&self, url: &str, include_comments: bool, include_images: bool) -> Result<ToolResult> {
        let parsed = parse_url(url).ok_or_else(|| anyhow!("Invalid Basecamp URL"))?;
        let api = self.client.as_ref();
        let mut result = Map::new();

        if let Some(recording_id) = &parsed.recording_id {
            match parsed.kind {
                UrlKind::Card => {
                    let card = expect_data(
                        api.get_card(&parsed.project_id, recording_id).await,
                        "Failed to read card",
                    )?;
                    result.insert("card".to_string(), card);
                }
                UrlKind::Todo => {
                    let todo = expect_data(
                        api.get_todo(&parsed.project_id, recording_id).await,
                        "Failed to read todo",
                    )?;
                    result.insert("todo".to_string(), todo);
                }
                UrlKind::Project | UrlKind::Column => {}
            }

            if include_comments {
                let comments = expect_data(
                    api.get_comments(&parsed.project_id, recording_id, 1).await,
                    "Failed to read comments",
                )?;
                if include_images {
                    if let Some(items) = comments.as_array() {
                        result.insert("images".to_string(), json!(extract_images(items)));
                    }
                }
                result.insert("comments".to_string(), comments);
            }
        }

        debug!("Read {} fields from {}", result.len(), url);
        pretty(&result)
    }
}

fn get_str(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// String argument, treating "" as absent
fn non_empty(args: &Map<String, Value>, key: &str) -> Option<String> {
    get_str(args, key).filter(|s| !s.is_empty())
}

fn get_int(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}

fn get_bool(args: &Map<String, Value>, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Array of numeric ids; non-numeric entries are ignored
fn get_ids(args: &Map<String, Value>, key: &str) -> Option<Vec<i64>> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
}

fn require(args: &Map<String, Value>, key: &str) -> Result<String> {
    get_str(args, key).ok_or_else(|| anyhow!("Missing required argument: {}", key))
}

/// Field of a response object as display text
fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn expect_data(resp: ApiResponse, context: &'static str) -> Result<Value> {
    resp.into_result().context(context)
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<ToolResult> {
    Ok(ToolResult::success(serde_json::to_string_pretty(value)?))
}

fn attachment_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"(?i)<bc-attachment([^>]*)>").expect("static pattern"),
            Regex::new(r#"href="([^"]+)""#).expect("static pattern"),
            Regex::new(r#"content-type="([^"]+)""#).expect("static pattern"),
        )
    })
}

/// Image URLs attached to comments via `<bc-attachment>` tags, in order
pub fn extract_images(comments: &[Value]) -> Vec<String> {
    let (tag, href, content_type) = attachment_patterns();

    comments
        .iter()
        .filter_map(|c| c.get("content").and_then(Value::as_str))
        .flat_map(|content| tag.captures_iter(content))
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let kind = content_type.captures(attrs)?.get(1)?.as_str();
            if !kind.starts_with("image/") {
                return None;
            }
            Some(href.captures(attrs)?.get(1)?.as_str().to_string())
        })
        .collect()
}
