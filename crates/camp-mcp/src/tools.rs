//! Basecamp Tool Definitions
//!
//! Every tool the server advertises via `tools/list`. Names share the
//! `basecamp_` prefix; ids are always passed as strings.

use serde_json::{json, Value};

use crate::protocol::{InputSchema, Tool};

/// Create a tool definition with the given name, description, and schema properties
fn tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let props = properties.as_object().cloned().unwrap_or_default();
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: InputSchema {
            schema_type: "object".to_string(),
            properties: props,
            required: required.into_iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// Tools that only need a project id and one other id
fn pair(name: &str, description: &str, second: &str) -> Tool {
    tool(
        name,
        description,
        json!({
            "project_id": {"type": "string", "description": "Project ID"},
            second: {"type": "string"}
        }),
        vec!["project_id", second],
    )
}

pub fn all_tools() -> Vec<Tool> {
    vec![
        // =========================================================================
        // Reading & commenting
        // =========================================================================
        tool(
            "basecamp_read",
            "Read a Basecamp card or todo with optional comments and images. Supports any Basecamp URL.",
            json!({
                "url": {"type": "string", "description": "Full Basecamp URL (e.g. https://3.basecamp.com/5798509/buckets/37594834/card_tables/cards/9010883489)"},
                "include_comments": {"type": "boolean", "description": "Include comments in the response", "default": true},
                "include_images": {"type": "boolean", "description": "Extract image URLs from comments", "default": true}
            }),
            vec!["url"],
        ),
        tool(
            "basecamp_comment",
            "Post a comment to any Basecamp card or todo",
            json!({
                "url": {"type": "string", "description": "Basecamp card or todo URL"},
                "comment": {"type": "string", "description": "Comment text (supports HTML formatting)"}
            }),
            vec!["url", "comment"],
        ),

        // =========================================================================
        // Projects
        // =========================================================================
        tool(
            "basecamp_list_projects",
            "List Basecamp projects (first page)",
            json!({
                "status": {"type": "string", "enum": ["active", "archived", "trashed"], "description": "Filter projects by status (default: active)"}
            }),
            vec![],
        ),
        tool(
            "basecamp_get_project",
            "Get detailed information about a specific project",
            json!({ "project_id": {"type": "string", "description": "Project ID"} }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_create_project",
            "Create a new Basecamp project",
            json!({
                "name": {"type": "string", "description": "Project name"},
                "description": {"type": "string", "description": "Project description"}
            }),
            vec!["name"],
        ),
        tool(
            "basecamp_update_project",
            "Update a project name or description",
            json!({
                "project_id": {"type": "string"},
                "name": {"type": "string"},
                "description": {"type": "string"}
            }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_trash_project",
            "Move a project to trash",
            json!({ "project_id": {"type": "string"} }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_find_project",
            "Find a project by name using live case-insensitive matching",
            json!({
                "search_term": {"type": "string", "description": "Project name or partial name to search for"}
            }),
            vec!["search_term"],
        ),

        // =========================================================================
        // Card tables
        // =========================================================================
        pair("basecamp_list_columns", "List all columns in a card table", "table_id"),
        pair("basecamp_list_cards", "List all cards in a specific column", "column_id"),
        pair("basecamp_get_card", "Get detailed information about a specific card", "card_id"),
        tool(
            "basecamp_create_card",
            "Create a new card in a specific column",
            json!({
                "project_id": {"type": "string", "description": "Project ID"},
                "column_id": {"type": "string", "description": "Column ID where the card will be created"},
                "title": {"type": "string", "description": "Card title"},
                "content": {"type": "string", "description": "Card description/content (supports HTML)"},
                "due_on": {"type": "string", "description": "Due date in YYYY-MM-DD format"},
                "assignee_ids": {"type": "array", "items": {"type": "number"}, "description": "Person IDs to assign"}
            }),
            vec!["project_id", "column_id", "title"],
        ),
        tool(
            "basecamp_update_card",
            "Update an existing card (title, content, assignees, due date, completion)",
            json!({
                "project_id": {"type": "string"},
                "card_id": {"type": "string"},
                "title": {"type": "string"},
                "content": {"type": "string"},
                "due_on": {"type": "string"},
                "assignee_ids": {"type": "array", "items": {"type": "number"}},
                "completed": {"type": "boolean"}
            }),
            vec!["project_id", "card_id"],
        ),
        tool(
            "basecamp_move_card",
            "Move a card to a different column (status change)",
            json!({
                "project_id": {"type": "string"},
                "card_id": {"type": "string"},
                "to_column": {"type": "string", "description": "Target column ID"},
                "position": {"type": "number", "description": "Position in the target column (1-based, optional)"}
            }),
            vec!["project_id", "card_id", "to_column"],
        ),
        pair("basecamp_trash_card", "Move a card to trash", "card_id"),

        // =========================================================================
        // Card steps
        // =========================================================================
        pair("basecamp_list_steps", "List all steps/checklist items on a card", "card_id"),
        tool(
            "basecamp_add_step",
            "Add a new step to a card",
            json!({
                "project_id": {"type": "string"},
                "card_id": {"type": "string"},
                "title": {"type": "string", "description": "Step description"}
            }),
            vec!["project_id", "card_id", "title"],
        ),
        pair("basecamp_complete_step", "Mark a step as completed", "step_id"),
        pair("basecamp_uncomplete_step", "Mark a step as incomplete", "step_id"),

        // =========================================================================
        // People
        // =========================================================================
        tool(
            "basecamp_list_people",
            "List people in the organization, or in one project",
            json!({
                "project_id": {"type": "string", "description": "Optional: only people in this project"}
            }),
            vec![],
        ),
        tool(
            "basecamp_get_person",
            "Get details about a specific person",
            json!({ "person_id": {"type": "string"} }),
            vec!["person_id"],
        ),

        // =========================================================================
        // Todos
        // =========================================================================
        pair("basecamp_get_todo", "Get details of a specific to-do", "todo_id"),
        tool(
            "basecamp_create_todo",
            "Create a new to-do in a to-do list",
            json!({
                "project_id": {"type": "string"},
                "todolist_id": {"type": "string"},
                "content": {"type": "string", "description": "To-do content/title"},
                "due_on": {"type": "string", "description": "Due date (YYYY-MM-DD)"},
                "assignee_ids": {"type": "array", "items": {"type": "number"}, "description": "Person IDs"}
            }),
            vec!["project_id", "todolist_id", "content"],
        ),
        tool(
            "basecamp_update_todo",
            "Update a to-do",
            json!({
                "project_id": {"type": "string"},
                "todo_id": {"type": "string"},
                "content": {"type": "string"},
                "description": {"type": "string", "description": "Detailed description (HTML)"},
                "assignee_ids": {"type": "array", "items": {"type": "number"}},
                "due_on": {"type": "string"},
                "starts_on": {"type": "string"}
            }),
            vec!["project_id", "todo_id"],
        ),
        pair("basecamp_complete_todo", "Mark a to-do as completed", "todo_id"),
        pair("basecamp_uncomplete_todo", "Mark a to-do as incomplete", "todo_id"),

        // =========================================================================
        // Activity
        // =========================================================================
        tool(
            "basecamp_get_events",
            "Get recent activity for the account or a specific project",
            json!({
                "project_id": {"type": "string", "description": "Optional: events for this project only"},
                "limit": {"type": "number", "description": "Number of events to return (default: 20)"}
            }),
            vec![],
        ),

        // =========================================================================
        // Project index
        // =========================================================================
        tool(
            "basecamp_index_build",
            "Build full index of all projects, card tables, and columns for fast lookups",
            json!({}),
            vec![],
        ),
        tool(
            "basecamp_index_update_project",
            "Update index for a specific project",
            json!({ "project_id": {"type": "string", "description": "Project ID to update in index"} }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_index_search",
            "Search projects by name in the index (fast lookup)",
            json!({ "query": {"type": "string", "description": "Case-insensitive substring of the project name"} }),
            vec!["query"],
        ),
        tool(
            "basecamp_index_get_project",
            "Get project details from index (project ID, card tables, columns)",
            json!({ "project_id": {"type": "string", "description": "Project ID"} }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_index_find_column",
            "Find a column by name within a project (fast lookup)",
            json!({
                "project_id": {"type": "string", "description": "Project ID"},
                "column_name": {"type": "string", "description": "Column name to search for (case-insensitive substring)"}
            }),
            vec!["project_id", "column_name"],
        ),
        tool(
            "basecamp_index_get_columns",
            "Get all columns for a project from index",
            json!({ "project_id": {"type": "string", "description": "Project ID"} }),
            vec!["project_id"],
        ),
        tool(
            "basecamp_index_stats",
            "Get index statistics (total projects, columns, last update time)",
            json!({}),
            vec![],
        ),

        // =========================================================================
        // Utility
        // =========================================================================
        tool(
            "basecamp_parse_url",
            "Parse a Basecamp URL to extract IDs (account, project, card/todo)",
            json!({ "url": {"type": "string"} }),
            vec!["url"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_prefixed() {
        let tools = all_tools();
        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
        assert!(tools.iter().all(|t| t.name.starts_with("basecamp_")));
    }

    #[test]
    fn test_required_fields_are_declared() {
        for tool in all_tools() {
            for field in &tool.input_schema.required {
                assert!(
                    tool.input_schema.properties.contains_key(field),
                    "{} requires undeclared {}",
                    tool.name,
                    field
                );
            }
        }
    }

    #[test]
    fn test_pair_schema() {
        let tool = pair("basecamp_get_card", "Get a card", "card_id");
        assert_eq!(tool.input_schema.required, vec!["project_id", "card_id"]);
        assert!(tool.input_schema.properties.contains_key("card_id"));
    }
}
