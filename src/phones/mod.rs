mod dto;
pub mod format;
pub mod handlers;
#[cfg(test)]
pub(crate) mod memory;
pub mod normalize;
pub mod readers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod writers;

use crate::state::AppState;
use axum::Router;

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes(body_limit))
}
