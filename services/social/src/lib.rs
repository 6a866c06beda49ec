//! Social graph service
//!
//! Users follow one another, look each other up, get follow suggestions and
//! receive notifications. State lives behind the [`repositories::SocialStore`]
//! port; HTTP handlers in [`routes`] stay thin over the operation modules.

pub mod config;
pub mod error;
pub mod graph;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod password;
pub mod profile;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod suggestions;
pub mod validation;

pub use state::AppState;
