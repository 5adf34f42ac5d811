use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use rollcall_database::Database;
use rollcall_kernel::domain::config::ApiConfig;
use rollcall_kernel::domain::roles::RoleSet;
use rollcall_kernel::server::{ApiState, AuthUser, ErrorBody, ErrorCode};
use tower::ServiceExt;

async fn whoami(AuthUser(actor): AuthUser) -> String {
    format!("{}:{}", actor.user_id, actor.roles.bits())
}

async fn app() -> (Router, ApiState) {
    let database = Database::builder().url("mem://").session("kernel", "test").init().await.unwrap();
    let state = ApiState::builder().config(ApiConfig::default()).db(database).build().unwrap();
    let router = Router::new().route("/whoami", get(whoami)).with_state(state.clone());
    (router, state)
}

async fn call(router: Router, authorization: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::get("/whoami");
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    (status, to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec())
}

#[tokio::test]
async fn valid_bearer_token_yields_actor() {
    let (router, state) = app().await;
    let issued = state.sessions.issue("u42", "ada@uni.edu", RoleSet::PROFESSOR).unwrap();

    let (status, body) = call(router, Some(&format!("Bearer {}", issued.token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"u42:2");
}

#[tokio::test]
async fn scheme_is_case_insensitive() {
    let (router, state) = app().await;
    let issued = state.sessions.issue("u1", "a@b.c", RoleSet::STUDENT).unwrap();

    let (status, _) = call(router, Some(&format!("bearer {}", issued.token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    for header in [None, Some("Basic Zm9vOmJhcg=="), Some("Bearer "), Some("Bearer nope")] {
        let (router, _) = app().await;
        let (status, body) = call(router, header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{header:?}");

        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error.code, ErrorCode::Unauthorized);
    }
}
