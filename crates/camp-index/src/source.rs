//! Remote capability the index is built from

use std::future::Future;
use std::sync::Arc;

use camp_api::{ApiResponse, BasecampClient, ProjectStatus};

/// The three reads the index needs from Basecamp.
///
/// Failures are reported inside the [`ApiResponse`] (error flag or non-2xx
/// code), never as a panic.
pub trait ProjectSource {
    /// One page of projects (pages start at 1)
    fn list_projects(&self, status: ProjectStatus, page: u32) -> impl Future<Output = ApiResponse> + Send;

    /// A single project including its `dock`
    fn get_project(&self, project_id: &str) -> impl Future<Output = ApiResponse> + Send;

    /// A card table including its `lists` (columns)
    fn get_card_table(&self, project_id: &str, card_table_id: &str) -> impl Future<Output = ApiResponse> + Send;
}

impl ProjectSource for BasecampClient {
    async fn list_projects(&self, status: ProjectStatus, page: u32) -> ApiResponse {
        self.get_projects(Some(status), page).await
    }

    async fn get_project(&self, project_id: &str) -> ApiResponse {
        BasecampClient::get_project(self, project_id).await
    }

    async fn get_card_table(&self, project_id: &str, card_table_id: &str) -> ApiResponse {
        BasecampClient::get_card_table(self, project_id, card_table_id).await
    }
}

impl<S: ProjectSource> ProjectSource for Arc<S> {
    fn list_projects(&self, status: ProjectStatus, page: u32) -> impl Future<Output = ApiResponse> + Send {
        (**self).list_projects(status, page)
    }

    fn get_project(&self, project_id: &str) -> impl Future<Output = ApiResponse> + Send {
        (**self).get_project(project_id)
    }

    fn get_card_table(&self, project_id: &str, card_table_id: &str) -> impl Future<Output = ApiResponse> + Send {
        (**self).get_card_table(project_id, card_table_id)
    }
}
