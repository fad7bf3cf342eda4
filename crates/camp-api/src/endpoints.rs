//! Basecamp resource endpoints
//!
//! One method per endpoint; all paths are relative to `/{account_id}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::BasecampClient;
use crate::response::ApiResponse;

/// Project lifecycle status used as a listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    Trashed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Trashed => "trashed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            "trashed" => Some(Self::Trashed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCard {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTodo {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
}

fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.max(1).to_string())]
}

fn to_body<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::Object(Map::new()))
}

impl BasecampClient {
    // ---------------------------------------------------------------------
    // Authorization
    // ---------------------------------------------------------------------

    pub async fn get_authorization(&self) -> ApiResponse {
        self.request(reqwest::Method::GET, "/authorization.json", None, &[])
            .await
    }

    // ---------------------------------------------------------------------
    // Projects
    // ---------------------------------------------------------------------

    pub async fn get_projects(&self, status: Option<ProjectStatus>, page: u32) -> ApiResponse {
        let mut query = page_query(page);
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        self.get("/projects.json", &query).await
    }

    pub async fn get_project(&self, project_id: &str) -> ApiResponse {
        self.get(&format!("/projects/{}.json", project_id), &[]).await
    }

    pub async fn create_project(&self, name: &str, description: &str) -> ApiResponse {
        let body = json!({ "name": name, "description": description });
        self.post("/projects.json", Some(&body)).await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ApiResponse {
        let mut body = Map::new();
        if let Some(name) = name.filter(|s| !s.is_empty()) {
            body.insert("name".into(), json!(name));
        }
        if let Some(description) = description.filter(|s| !s.is_empty()) {
            body.insert("description".into(), json!(description));
        }
        self.put(&format!("/projects/{}.json", project_id), &Value::Object(body))
            .await
    }

    pub async fn trash_project(&self, project_id: &str) -> ApiResponse {
        self.delete(&format!("/projects/{}.json", project_id)).await
    }

    // ---------------------------------------------------------------------
    // Card tables & columns
    // ---------------------------------------------------------------------

    pub async fn get_card_table(&self, project_id: &str, card_table_id: &str) -> ApiResponse {
        self.get(
            &format!("/buckets/{}/card_tables/{}.json", project_id, card_table_id),
            &[],
        )
        .await
    }

    pub async fn get_columns(&self, project_id: &str, card_table_id: &str, page: u32) -> ApiResponse {
        self.get(
            &format!(
                "/buckets/{}/card_tables/{}/columns.json",
                project_id, card_table_id
            ),
            &page_query(page),
        )
        .await
    }

    pub async fn get_column(&self, project_id: &str, column_id: &str) -> ApiResponse {
        self.get(
            &format!("/buckets/{}/card_tables/columns/{}.json", project_id, column_id),
            &[],
        )
        .await
    }

    pub async fn create_column(
        &self,
        project_id: &str,
        card_table_id: &str,
        title: &str,
        color: Option<&str>,
    ) -> ApiResponse {
        let mut body = json!({ "title": title });
        if let Some(color) = color {
            body["color"] = json!(color);
        }
        self.post(
            &format!(
                "/buckets/{}/card_tables/{}/columns.json",
                project_id, card_table_id
            ),
            Some(&body),
        )
        .await
    }

    pub async fn update_column(
        &self,
        project_id: &str,
        column_id: &str,
        title: Option<&str>,
        color: Option<&str>,
    ) -> ApiResponse {
        let mut body = Map::new();
        if let Some(title) = title {
            body.insert("title".into(), json!(title));
        }
        if let Some(color) = color {
            body.insert("color".into(), json!(color));
        }
        self.put(
            &format!("/buckets/{}/card_tables/columns/{}.json", project_id, column_id),
            &Value::Object(body),
        )
        .await
    }

    // ---------------------------------------------------------------------
    // Cards
    // ---------------------------------------------------------------------

    pub async fn get_cards(&self, project_id: &str, column_id: &str, page: u32) -> ApiResponse {
        self.get(
            &format!(
                "/buckets/{}/card_tables/columns/{}/cards.json",
                project_id, column_id
            ),
            &page_query(page),
        )
        .await
    }

    pub async fn get_card(&self, project_id: &str, card_id: &str) -> ApiResponse {
        self.get(
            &format!("/buckets/{}/card_tables/cards/{}.json", project_id, card_id),
            &[],
        )
        .await
    }

    pub async fn create_card(&self, project_id: &str, column_id: &str, card: &NewCard) -> ApiResponse {
        self.post(
            &format!(
                "/buckets/{}/card_tables/columns/{}/cards.json",
                project_id, column_id
            ),
            Some(&to_body(card)),
        )
        .await
    }

    pub async fn update_card(&self, project_id: &str, card_id: &str, update: &CardUpdate) -> ApiResponse {
        self.put(
            &format!("/buckets/{}/card_tables/cards/{}.json", project_id, card_id),
            &to_body(update),
        )
        .await
    }

    pub async fn move_card(
        &self,
        project_id: &str,
        card_id: &str,
        column_id: &str,
        position: Option<i64>,
    ) -> ApiResponse {
        let mut body = json!({ "column_id": column_id });
        if let Some(position) = position {
            body["position"] = json!(position);
        }
        self.post(
            &format!(
                "/buckets/{}/card_tables/cards/{}/moves.json",
                project_id, card_id
            ),
            Some(&body),
        )
        .await
    }

    pub async fn trash_card(&self, project_id: &str, card_id: &str) -> ApiResponse {
        self.delete(&format!(
            "/buckets/{}/card_tables/cards/{}.json",
            project_id, card_id
        ))
        .await
    }

    // ---------------------------------------------------------------------
    // Card steps
    // ---------------------------------------------------------------------

    pub async fn get_steps(&self, project_id: &str, card_id: &str) -> ApiResponse {
        self.get(
            &format!(
                "/buckets/{}/card_tables/cards/{}/steps.json",
                project_id, card_id
            ),
            &[],
        )
        .await
    }

    pub async fn get_step(&self, project_id: &str, step_id: &str) -> ApiResponse {
        self.get(
            &format!("/buckets/{}/card_tables/steps/{}.json", project_id, step_id),
            &[],
        )
        .await
    }

    pub async fn create_step(&self, project_id: &str, card_id: &str, title: &str) -> ApiResponse {
        self.post(
            &format!(
                "/buckets/{}/card_tables/cards/{}/steps.json",
                project_id, card_id
            ),
            Some(&json!({ "title": title })),
        )
        .await
    }

    pub async fn update_step(
        &self,
        project_id: &str,
        step_id: &str,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> ApiResponse {
        let mut body = Map::new();
        if let Some(title) = title.filter(|s| !s.is_empty()) {
            body.insert("title".into(), json!(title));
        }
        if let Some(completed) = completed {
            body.insert("completed".into(), json!(completed));
        }
        self.put(
            &format!("/buckets/{}/card_tables/steps/{}.json", project_id, step_id),
            &Value::Object(body),
        )
        .await
    }

    pub async fn complete_step(&self, project_id: &str, step_id: &str) -> ApiResponse {
        self.update_step(project_id, step_id, None, Some(true)).await
    }

    pub async fn uncomplete_step(&self, project_id: &str, step_id: &str) -> ApiResponse {
        self.update_step(project_id, step_id, None, Some(false)).await
    }

    // ---------------------------------------------------------------------
    // Comments
    // ---------------------------------------------------------------------

    pub async fn get_comments(&self, project_id: &str, recording_id: &str, page: u32) -> ApiResponse {
        self.get(
            &format!(
                "/buckets/{}/recordings/{}/comments.json",
                project_id, recording_id
            ),
            &page_query(page),
        )
        .await
    }

    pub async fn get_comment(&self, project_id: &str, comment_id: &str) -> ApiResponse {
        self.get(
            &format!("/buckets/{}/comments/{}.json", project_id, comment_id),
            &[],
        )
        .await
    }

    pub async fn create_comment(&self, project_id: &str, recording_id: &str, content: &str) -> ApiResponse {
        self.post(
            &format!(
                "/buckets/{}/recordings/{}/comments.json",
                project_id, recording_id
            ),
            Some(&json!({ "content": content })),
        )
        .await
    }

    pub async fn update_comment(&self, project_id: &str, comment_id: &str, content: &str) -> ApiResponse {
        self.put(
            &format!("/buckets/{}/comments/{}.json", project_id, comment_id),
            &json!({ "content": content }),
        )
        .await
    }

    pub async fn trash_comment(&self, project_id: &str, comment_id: &str) -> ApiResponse {
        self.delete(&format!("/buckets/{}/comments/{}.json", project_id, comment_id))
            .await
    }

    // ---------------------------------------------------------------------
    // Todos
    // ---------------------------------------------------------------------

    pub async fn get_todo(&self, project_id: &str, todo_id: &str) -> ApiResponse {
        self.get(&format!("/buckets/{}/todos/{}.json", project_id, todo_id), &[])
            .await
    }

    pub async fn create_todo(&self, project_id: &str, todolist_id: &str, todo: &NewTodo) -> ApiResponse {
        self.post(
            &format!(
                "/buckets/{}/todolists/{}/todos.json",
                project_id, todolist_id
            ),
            Some(&to_body(todo)),
        )
        .await
    }

    pub async fn update_todo(&self, project_id: &str, todo_id: &str, update: &TodoUpdate) -> ApiResponse {
        self.put(
            &format!("/buckets/{}/todos/{}.json", project_id, todo_id),
            &to_body(update),
        )
        .await
    }

    pub async fn complete_todo(&self, project_id: &str, todo_id: &str) -> ApiResponse {
        self.post(
            &format!("/buckets/{}/todos/{}/completion.json", project_id, todo_id),
            None,
        )
        .await
    }

    pub async fn uncomplete_todo(&self, project_id: &str, todo_id: &str) -> ApiResponse {
        self.delete(&format!(
            "/buckets/{}/todos/{}/completion.json",
            project_id, todo_id
        ))
        .await
    }

    // ---------------------------------------------------------------------
    // People
    // ---------------------------------------------------------------------

    pub async fn get_people(&self, page: u32) -> ApiResponse {
        self.get("/people.json", &page_query(page)).await
    }

    pub async fn get_project_people(&self, project_id: &str, page: u32) -> ApiResponse {
        self.get(
            &format!("/projects/{}/people.json", project_id),
            &page_query(page),
        )
        .await
    }

    pub async fn get_person(&self, person_id: &str) -> ApiResponse {
        self.get(&format!("/people/{}.json", person_id), &[]).await
    }

    pub async fn get_my_profile(&self) -> ApiResponse {
        self.get("/my/profile.json", &[]).await
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    pub async fn get_events(&self, page: u32, since: Option<&str>) -> ApiResponse {
        let mut query = page_query(page);
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        self.get("/events.json", &query).await
    }

    pub async fn get_project_events(&self, project_id: &str, page: u32, since: Option<&str>) -> ApiResponse {
        let mut query = page_query(page);
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        self.get(&format!("/buckets/{}/events.json", project_id), &query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(ProjectStatus::parse("Archived"), Some(ProjectStatus::Archived));
        assert_eq!(ProjectStatus::parse("trashed"), Some(ProjectStatus::Trashed));
        assert_eq!(ProjectStatus::parse("deleted"), None);
        assert_eq!(ProjectStatus::default().as_str(), "active");
    }

    #[test]
    fn test_card_update_only_sends_present_fields() {
        let update = CardUpdate {
            title: Some("New".to_string()),
            completed: Some(false),
            ..Default::default()
        };
        assert_eq!(
            to_body(&update),
            json!({ "title": "New", "completed": false })
        );
    }

    #[test]
    fn test_new_card_omits_empty_assignees() {
        let card = NewCard {
            title: "Fix login".to_string(),
            content: String::new(),
            due_on: Some("2026-01-31".to_string()),
            assignee_ids: vec![],
        };
        assert_eq!(
            to_body(&card),
            json!({ "title": "Fix login", "content": "", "due_on": "2026-01-31" })
        );
    }

    #[test]
    fn test_page_query_clamps_to_first_page() {
        assert_eq!(page_query(0), vec![("page", "1".to_string())]);
        assert_eq!(page_query(3), vec![("page", "3".to_string())]);
    }
}
