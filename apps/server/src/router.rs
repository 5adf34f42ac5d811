use axum::Router;
use axum::http::{HeaderValue, Method, header};
use rollcall::domain::constants::{
    ANALYTICS_TAG, ATTENDANCE_TAG, COURSES_TAG, IDENTITY_TAG, SYSTEM_TAG,
};
use rollcall::kernel::prelude::ApiState;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub(crate) const SECURITY_SCHEME: &str = "bearer_auth";

#[derive(OpenApi)]
#[openapi(
    info(title = "Roll Call API", description = "Classroom attendance with signed QR check-ins"),
    modifiers(&BearerAuth),
    tags(
        (name = SYSTEM_TAG, description = "Service health"),
        (name = IDENTITY_TAG, description = "Accounts, profiles and roles"),
        (name = COURSES_TAG, description = "Courses and check-in codes"),
        (name = ATTENDANCE_TAG, description = "Check-ins and attendance records"),
        (name = ANALYTICS_TAG, description = "Attendance reports"),
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            SECURITY_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub(crate) fn init(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(rollcall::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    let scalar_routes = Scalar::with_url("/api", api_doc);

    Router::new().merge(openapi_routes).merge(scalar_routes)
}

/// Any origin when the list is empty; unparsable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim())
                .inspect_err(|_| warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
