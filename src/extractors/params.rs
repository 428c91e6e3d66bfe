//! Extract blueprint parameters (path + query string) and the transport kind from a request.

use crate::error::AppError;
use crate::request::RequestParams;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query},
    http::{header, request::Parts},
};
use std::collections::HashMap;

/// Path segment naming the served model; routing data, never a parameter.
pub const MODEL_PATH_PARAM: &str = "model";

/// Query and path parameters merged (path wins), plus whether the request is a websocket upgrade.
#[derive(Clone, Debug)]
pub struct BlueprintParams {
    pub params: RequestParams,
    pub socket: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for BlueprintParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path = Option::<Path<HashMap<String, String>>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let Query(query) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut params = RequestParams::from_strings(query);
        if let Some(Path(path)) = path {
            for (k, v) in path.into_iter().filter(|(k, _)| k != MODEL_PATH_PARAM) {
                params.insert(k, serde_json::Value::String(v));
            }
        }

        let socket = parts
            .headers
            .get(header::UPGRADE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);
        Ok(BlueprintParams { params, socket })
    }
}
