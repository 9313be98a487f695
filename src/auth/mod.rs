use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
mod validate;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
