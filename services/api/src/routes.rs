use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use rentify::clients::{AccountGateway, DocumentGateway};
use rentify::workflows::registration::{registration_router, RegistrationSubmitter};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_registration_routes<A, D>(
    submitter: Arc<RegistrationSubmitter<A, D>>,
) -> axum::Router
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    registration_router(submitter)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rentify::clients::{DocumentClient, HttpTransport, Service, UserClient};
    use rentify::config::RegistrationSettings;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn router(state: AppState) -> axum::Router {
        let transport = |service| {
            HttpTransport::new(service, "http://127.0.0.1:9/api", None).expect("transport builds")
        };
        let submitter = Arc::new(RegistrationSubmitter::new(
            Arc::new(UserClient::new(transport(Service::User))),
            Arc::new(DocumentClient::new(transport(Service::Document))),
            RegistrationSettings::default(),
        ));
        with_registration_routes(submitter).layer(Extension(state))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let response = router(state(false))
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let app_state = state(false);
        let response = router(app_state.clone())
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");

        app_state.readiness.store(true, Ordering::Release);
        let response = router(app_state)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn registration_routes_are_mounted() {
        let response = router(state(true))
            .oneshot(
                Request::post("/api/v1/registration/personal-data")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"]["rol"], "Debe seleccionar un tipo de cuenta");
    }
}
