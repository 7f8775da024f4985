use std::{convert::Infallible, sync::Arc};

use filters::api_filters;
use serde_json::json;
use warp::{http::Method, http::StatusCode, reject::Rejection, Filter};

use crate::core::service::CheckinService;

pub mod dashboard;
pub mod filters;
pub mod handlers;
pub mod streams;

async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, kind, msg) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not Found".to_string())
    } else if let Some(err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        log::warn!("{}", err);
        (StatusCode::BAD_REQUEST, "validation", err.to_string())
    } else if let Some(err) = err.find::<warp::reject::InvalidQuery>() {
        log::warn!("Invalid Query: {}", err);
        (StatusCode::BAD_REQUEST, "validation", err.to_string())
    } else if let Some(err) = err.find::<warp::reject::UnsupportedMediaType>() {
        log::warn!("Unsupported Media Type: {}", err);
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "validation", err.to_string())
    } else if let Some(err) = err.find::<warp::reject::MethodNotAllowed>() {
        log::warn!("Method Not Allowed: {}", err);
        (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", err.to_string())
    } else {
        log::error!("Unhandled Rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": kind, "message": msg })),
        code,
    ))
}

pub fn routes(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    api_filters(service).recover(handle_rejection)
}

pub async fn run_http_server(service: Arc<CheckinService>, port: u16) -> anyhow::Result<()> {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "User-Agent",
            "Sec-Fetch-Mode",
            "Referer",
            "Origin",
            "Content-Type",
            "Access-Control-Allow-Origin",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
            "Access-Control-Allow-Headers",
        ])
        .allow_methods(&[
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    log::info!("Serving check-in API on port {}", port);
    warp::serve(routes(service).with(cors))
        .run(([0, 0, 0, 0], port))
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{core::service::testing::service_with, integrations::startgg::fake::FakeLookup};

    #[tokio::test]
    async fn test_rejections_are_json() {
        let (_, service) = service_with(json!({"is_active": true}), FakeLookup::default());
        let routes = routes(service);

        let response = warp::test::request()
            .method("GET")
            .path("/api/nothing-here")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = warp::test::request()
            .method("PATCH")
            .path("/api/checkins/toggle")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], json!("validation"));
    }
}
