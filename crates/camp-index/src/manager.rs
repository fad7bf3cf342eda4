//! Index lifecycle: lazy load, rebuild, per-project refresh, queries

use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use camp_api::ProjectStatus;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::IndexError;
use crate::model::{now_timestamp, CardTable, Column, Index, IndexStats, ProjectEntry, INDEX_VERSION};
use crate::remote::{columns_from_card_table, CardTableRef, RemoteProject};
use crate::report::{RebuildReport, RefreshOutcome, Skip};
use crate::source::ProjectSource;
use crate::store;

/// Page size the project listing uses. A shorter page is taken to be the last.
pub const PAGE_SIZE: usize = 100;

/// Owns the in-memory index and the file it persists to.
///
/// The index is read from disk on first use and then kept for the lifetime of
/// the manager. Mutations (`rebuild_full`, `refresh_project`) save immediately.
pub struct IndexManager<S> {
    source: S,
    path: PathBuf,
    index: OnceCell<Index>,
}

struct TableFailure {
    card_table_id: String,
    reason: String,
}

impl<S: ProjectSource> IndexManager<S> {
    pub fn new(source: S, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
            index: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current index, read from disk on first call. Never fails.
    pub fn load(&self) -> &Index {
        self.index.get_or_init(|| store::load_or_empty(&self.path))
    }

    /// Persist the current index, replacing the file
    pub fn save(&self) -> Result<(), IndexError> {
        store::write_index(&self.path, self.load())
    }

    /// Re-derive every active project from Basecamp.
    ///
    /// A card table that fails to load is skipped and its project kept with
    /// the tables that did load. Failing to list projects aborts the rebuild
    /// and leaves the current index as it was.
    pub async fn rebuild_full(&mut self) -> Result<RebuildReport, IndexError> {
        info!("Building full index from Basecamp");

        let listed = self.list_active_projects().await?;
        info!("Found {} projects", listed.len());

        let mut report = RebuildReport::default();
        let mut projects = Vec::with_capacity(listed.len());
        let mut seen = HashSet::new();

        for raw in &listed {
            let Some(project) = RemoteProject::from_value(raw) else {
                warn!("Skipping project listing without an id");
                report.skipped.push(Skip::project(None, "listing record has no id"));
                continue;
            };
            if !seen.insert(project.id.clone()) {
                debug!("Project {} listed twice, keeping first", project.id);
                continue;
            }

            debug!("Indexing: {}", project.name);
            let (card_tables, failures) = self.resolve_card_tables(&project).await;
            for failure in failures {
                report.skipped.push(Skip::card_table(
                    &project.id,
                    &failure.card_table_id,
                    failure.reason,
                ));
            }

            let entry = to_entry(project, card_tables);
            report.record(&entry);
            projects.push(entry);
        }

        let index = Index {
            version: INDEX_VERSION.to_string(),
            last_full_update: now_timestamp(),
            projects,
        };
        report.last_full_update = index.last_full_update.clone();

        self.index = OnceCell::from(index);
        self.save()?;

        info!("{}", report.summary());
        Ok(report)
    }

    /// Re-derive one project and upsert it.
    ///
    /// Any fetch failure returns [`RefreshOutcome::Failed`] and leaves the
    /// index untouched; only a failed save is an `Err`.
    pub async fn refresh_project(&mut self, project_id: &str) -> Result<RefreshOutcome, IndexError> {
        let entry = match self.fetch_project_entry(project_id).await {
            Ok(entry) => entry,
            Err(reason) => {
                warn!("Failed to update project {}: {}", project_id, reason);
                return Ok(RefreshOutcome::Failed {
                    project_id: project_id.to_string(),
                    reason,
                });
            }
        };

        let mut index = self
            .index
            .take()
            .unwrap_or_else(|| store::load_or_empty(&self.path));
        let replaced = index.upsert(entry.clone());
        self.index = OnceCell::from(index);
        self.save()?;

        debug!(
            "{} project {} in index",
            if replaced { "Replaced" } else { "Added" },
            project_id
        );
        Ok(RefreshOutcome::Refreshed(entry))
    }

    pub fn search(&self, query: &str) -> Vec<&ProjectEntry> {
        self.load().search(query)
    }

    pub fn get_project(&self, project_id: &str) -> Option<&ProjectEntry> {
        self.load().get(project_id)
    }

    pub fn find_column(&self, project_id: &str, column_name: &str) -> Option<&Column> {
        self.load().find_column(project_id, column_name)
    }

    pub fn project_columns(&self, project_id: &str) -> Vec<&Column> {
        self.load().project_columns(project_id)
    }

    pub fn stats(&self) -> IndexStats {
        self.load().stats(self.path.clone())
    }

    /// Page through active projects until an empty or short page
    async fn list_active_projects(&self) -> Result<Vec<Value>, IndexError> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let context = format!("Failed to list projects (page {})", page);
            let data = self
                .source
                .list_projects(ProjectStatus::Active, page)
                .await
                .into_result()
                .map_err(|e| IndexError::remote(&context, e))?;

            let Value::Array(items) = data else {
                return Err(IndexError::remote(
                    context,
                    camp_api::ApiError::Shape("project listing is not an array".to_string()),
                ));
            };

            let count = items.len();
            all.extend(items);
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    async fn fetch_project_entry(&self, project_id: &str) -> Result<ProjectEntry, String> {
        let data = self
            .source
            .get_project(project_id)
            .await
            .into_result()
            .map_err(|e| e.to_string())?;
        let project = RemoteProject::from_value(&data)
            .ok_or_else(|| "project payload has no id".to_string())?;

        let (card_tables, failures) = self.resolve_card_tables(&project).await;
        if let Some(failure) = failures.into_iter().next() {
            return Err(format!(
                "card table {}: {}",
                failure.card_table_id, failure.reason
            ));
        }

        Ok(to_entry(project, card_tables))
    }

    async fn resolve_card_tables(&self, project: &RemoteProject) -> (Vec<CardTable>, Vec<TableFailure>) {
        let mut tables = Vec::with_capacity(project.card_tables.len());
        let mut failures = Vec::new();

        for table in &project.card_tables {
            match self.fetch_card_table(&project.id, table).await {
                Ok(card_table) => {
                    debug!("  {}: {} columns", card_table.title, card_table.columns.len());
                    tables.push(card_table);
                }
                Err(reason) => {
                    warn!(
                        "Failed to fetch card table {} of project {}: {}",
                        table.id, project.id, reason
                    );
                    failures.push(TableFailure {
                        card_table_id: table.id.clone(),
                        reason,
                    });
                }
            }
        }

        (tables, failures)
    }

    async fn fetch_card_table(&self, project_id: &str, table: &CardTableRef) -> Result<CardTable, String> {
        let data = self
            .source
            .get_card_table(project_id, &table.id)
            .await
            .into_result()
            .map_err(|e| e.to_string())?;

        Ok(CardTable {
            id: table.id.clone(),
            title: table.title.clone(),
            columns: columns_from_card_table(&data),
        })
    }
}

fn to_entry(project: RemoteProject, card_tables: Vec<CardTable>) -> ProjectEntry {
    ProjectEntry {
        id: project.id,
        name: project.name,
        status: project.status,
        card_tables,
        last_updated: now_timestamp(),
    }
}
