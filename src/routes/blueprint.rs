//! Blueprint routes. The model is a path parameter; handlers look up its resolved route.

use crate::handlers::{find, subscribe};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn blueprint_routes(state: AppState) -> Router {
    Router::new()
        .route("/blueprints/:model", get(find))
        .route("/blueprints/:model/subscriptions", post(subscribe))
        .route("/blueprints/:model/:id", get(find))
        .with_state(state)
}
