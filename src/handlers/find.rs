//! Blueprint handlers: resolve the find query for a model, and register subscriptions for a fetched record.

use crate::config::{ResolvedModel, ResolvedRoute};
use crate::criteria::CriteriaResolver;
use crate::error::AppError;
use crate::extractors::{BlueprintParams, MODEL_PATH_PARAM};
use crate::populate::PopulationResolver;
use crate::query::{FindQuery, Paging};
use crate::request::BlueprintRequest;
use crate::state::AppState;
use crate::subscribe::SubscriptionResolver;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn route_for<'m>(model: &'m ResolvedModel, path: &HashMap<String, String>) -> Result<&'m ResolvedRoute, AppError> {
    let name = path
        .get(MODEL_PATH_PARAM)
        .ok_or_else(|| AppError::BadRequest("missing model segment".into()))?;
    model.route(name).ok_or_else(|| AppError::NotFound(name.clone()))
}

/// Resolve criteria, paging and population for `GET /blueprints/:model[/:id]`.
pub fn build_find_query(model: &ResolvedModel, route: &ResolvedRoute, req: &BlueprintRequest) -> Result<FindQuery, AppError> {
    let config = model.blueprints.as_ref();
    let criteria = CriteriaResolver::new(config).resolve_with(req, &route.blacklist)?;
    let query = FindQuery::new(route.model.clone())
        .with_criteria(criteria)
        .with_paging(Paging::from_request(req));
    Ok(PopulationResolver::new(config).resolve(query, req))
}

pub async fn find(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    BlueprintParams { params, socket }: BlueprintParams,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model.as_ref();
    let route = route_for(model, &path)?;
    let req = BlueprintRequest {
        params,
        socket,
        options: route.options.clone(),
    };
    let query = build_find_query(model, route, &req)?;
    tracing::debug!(model = %route.model, populate = query.populate.len(), "find query resolved");
    Ok(crate::response::success_one_ok(query))
}

/// `POST /blueprints/:model/subscriptions` with the fetched record as body.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    BlueprintParams { params, socket }: BlueprintParams,
    Json(record): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if !record.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    let model = state.model.as_ref();
    let route = route_for(model, &path)?;
    let req = BlueprintRequest {
        params,
        socket,
        options: route.options.clone(),
    };
    let resolver = SubscriptionResolver::new(model.blueprints.as_ref());
    let plan = resolver.subscribe(&req, &record, state.registry.as_ref())?;
    let count = plan.targets.len();
    Ok(crate::response::success_one_with_meta(plan, serde_json::json!({ "count": count })))
}
