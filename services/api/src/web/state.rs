//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::config::Config;
use sat_content_core::content::ContentPipeline;
use sat_content_core::ports::DataStoreService;
use sat_content_core::study::StudyPlanner;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The workflows receive their collaborators by injection at construction
/// time, so tests can substitute fakes without touching globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStoreService>,
    pub pipeline: Arc<ContentPipeline>,
    pub planner: Arc<StudyPlanner>,
    pub config: Arc<Config>,
}

/// The authenticated caller, resolved by the auth middleware and inserted
/// into request extensions for handlers to use. Holds the user's email,
/// which is also the identity the workflows authorize against.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);
