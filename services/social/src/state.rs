//! Application state shared across handlers

use std::sync::Arc;

use crate::{middleware::JwtVerifier, repositories::SocialStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub jwt_verifier: JwtVerifier,
    pub suggestion_limit: usize,
}
