pub mod middleware;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;

use crate::backend::BackendClient;
use crate::catalog::Catalog;
use crate::harness::controller::RunController;
use crate::workspace::Workspace;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RunController>,
    pub workspace: Arc<Workspace>,
    pub catalog: Arc<Catalog>,
    pub backend: Arc<BackendClient>,
}

pub fn create_app(state: AppState, ui_dir: Option<PathBuf>) -> Router {
    routes::build_router(state, ui_dir)
}
