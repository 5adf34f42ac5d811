use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rollcall_database::Database;
use rollcall_kernel::domain::config::ApiConfig;
use rollcall_kernel::server::router::system_router;
use rollcall_kernel::server::{ApiState, HealthResponse};
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_an_answering_database() {
    let database = Database::builder().url("mem://").session("kernel", "health").init().await.unwrap();
    let state = ApiState::builder().config(ApiConfig::default()).db(database).build().unwrap();
    let (router, _) = system_router().split_for_parts();

    let response = router
        .with_state(state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::PRAGMA).unwrap(), "no-cache");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "up");
    assert!(health.database);
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}
