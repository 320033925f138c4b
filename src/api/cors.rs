//! Permissive CORS handling for the REST API
//!
//! The service is called directly from browser pages on other origins, so
//! every response allows any origin and every `OPTIONS` request is answered
//! as a preflight with `204 No Content`, whatever its path.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};

const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// CORS middleware
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use apworld_forge::api::cors::allow_any_origin;
///
/// let router: Router = Router::new().layer(middleware::from_fn(allow_any_origin));
/// ```
pub async fn allow_any_origin(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}
