//! HTTP API for the form generator

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::generation::FormGenerator;
use crate::progress::ProgressConfig;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(generator: Arc<dyn FormGenerator>, progress: ProgressConfig) -> Self {
        Self {
            runtime: Arc::new(RuntimeManager::new(generator, progress)),
        }
    }
}
