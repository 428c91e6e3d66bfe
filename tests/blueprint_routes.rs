use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use blueprint_sdk::{blueprint_routes, common_routes, from_json_str, resolve, AppState, MemoryRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ROUTES: &str = r#"[
    {
        "model": "pet",
        "relations": [
            {"alias": "owner", "type": "model", "model": "user"},
            {"alias": "tags", "type": "collection", "collection": "tag"}
        ],
        "jsonp": true,
        "where": {"archived": false}
    },
    {"model": "user"},
    {"model": "tag", "primary_key": "slug"}
]"#;

fn app_with(blueprints: &str) -> (Router, Arc<MemoryRegistry>) {
    let model = resolve(&from_json_str(blueprints, ROUTES).unwrap()).unwrap();
    let registry = Arc::new(MemoryRegistry::from_model(&model));
    let state = AppState::new(model, registry.clone());
    (blueprint_routes(state), registry)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn find_resolves_criteria_paging_and_population() {
    let (app, _) = app_with("");
    let (status, body) = get(app, "/blueprints/pet?name=rex&limit=10&skip=0&sort=id&callback=cb").await;
    assert_eq!(status, StatusCode::OK);
    let q = &body["data"];
    assert_eq!(q["model"], json!("pet"));
    assert_eq!(q["where"], json!({"archived": false, "name": "rex"}));
    assert_eq!(q["limit"], json!(10));
    assert_eq!(q["skip"], json!(0));
    assert_eq!(
        q["populate"],
        json!([{"alias": "owner", "limit": 10}, {"alias": "tags", "limit": 10}])
    );
}

#[tokio::test]
async fn find_one_uses_path_id_as_criteria() {
    let (app, _) = app_with(r#"{"populate": false}"#);
    let (status, body) = get(app, "/blueprints/pet/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["where"], json!({"archived": false, "id": "7"}));
    assert_eq!(body["data"]["populate"], json!([]));
}

#[tokio::test]
async fn populate_param_and_per_relation_options() {
    let (app, _) = app_with("");
    let uri = "/blueprints/pet?populate=tags&populate_tags=%7B%22limit%22%3A5%2C%22sort%22%3A%22name%22%7D";
    let (_, body) = get(app, uri).await;
    assert_eq!(body["data"]["populate"], json!([{"alias": "tags", "limit": 5, "sort": "name"}]));
    assert_eq!(body["data"]["where"], json!({"archived": false}));
}

#[tokio::test]
async fn explicit_where_param_wins() {
    let (app, _) = app_with("");
    let uri = "/blueprints/pet?where=%7B%22age%22%3A3%7D&name=ignored";
    let (_, body) = get(app, uri).await;
    assert_eq!(body["data"]["where"], json!({"archived": false, "age": 3}));
}

#[tokio::test]
async fn where_param_never_becomes_a_filter() {
    let (app, _) = app_with("");
    let (_, body) = get(app.clone(), "/blueprints/pet?where=5&name=rex").await;
    assert_eq!(body["data"]["where"], json!({"archived": false}));

    let (_, body) = get(app, "/blueprints/pet?where=%7Bnope&name=rex").await;
    assert_eq!(body["data"]["where"], json!({"archived": false, "name": "rex"}));
}

#[tokio::test]
async fn common_routes_serve_health_and_version_only() {
    let (status, body) = get(common_routes(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    let (status, body) = get(common_routes(), "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("blueprint-sdk"));

    let res = common_routes()
        .oneshot(Request::get("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn strict_where_rejects_malformed_json() {
    let (app, _) = app_with(r#"{"strict_where": true}"#);
    let (status, body) = get(app, "/blueprints/pet?where=%7Bnope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("E_WHERE_CLAUSE_UNPARSEABLE"));
}

#[tokio::test]
async fn unknown_model_is_not_found() {
    let (app, _) = app_with("");
    let (status, body) = get(app, "/blueprints/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn subscriptions_register_related_records() {
    let (app, registry) = app_with(r#"{"auto_watch": true}"#);
    let record = json!({"id": 1, "owner": {"id": 7}, "tags": [{"slug": "good"}, {"slug": "small"}]});
    let req = Request::post("/blueprints/pet/subscriptions")
        .header("content-type", "application/json")
        .body(Body::from(record.to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], json!(3));
    assert_eq!(body["data"]["watch"], json!(["user", "tag"]));

    let user = registry.get("user").unwrap();
    assert_eq!(user.subscribed_keys(), vec![json!(7)]);
    assert_eq!(user.watch_count(), 1);
    assert_eq!(registry.get("tag").unwrap().subscribed_keys(), vec![json!("good"), json!("small")]);
}
