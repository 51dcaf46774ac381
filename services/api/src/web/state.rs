//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::config::Config;
use wordtrail_core::ports::{
    ContributionStore, IdentityStore, PageFetcher, Translator, VocabularyStore,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityStore>,
    pub vocabulary: Arc<dyn VocabularyStore>,
    pub contributions: Arc<dyn ContributionStore>,
    pub translator: Arc<dyn Translator>,
    pub pages: Arc<dyn PageFetcher>,
    pub config: Arc<Config>,
}
