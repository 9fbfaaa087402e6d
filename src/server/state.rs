use crate::config::Configuration;
use crate::domain::Collector;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub configuration: Arc<Configuration>,
    pub collector: Arc<dyn Collector>,
}

impl FromRef<AppState> for Arc<dyn Collector> {
    fn from_ref(state: &AppState) -> Self {
        state.collector.clone()
    }
}
