use std::sync::Arc;

use skyfare_search::SearchOrchestrator;
use skyfare_store::app_config::SearchRules;
use skyfare_store::SearchStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SearchStore>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub rules: SearchRules,
    pub port: u16,
}
