pub mod middleware;

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    body::{self, Bytes},
    extract::Extension,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{trace::TraceLayer, ServiceBuilderExt};

use crate::{
    auth::{VerifiedSender, Verifier},
    config::Config,
    error::{ErrorCode, ErrorCodeDetail},
    server_info::ServerInfo,
};

use self::middleware::VerifyHmacSignatureLayer;

impl IntoResponse for ErrorCode {
    fn into_response(self) -> Response {
        let details: ErrorCodeDetail = (&self).into();
        let json_data = serde_json::to_string(&details).unwrap();
        let body = body::boxed(body::Full::from(json_data));

        Response::builder()
            .status(details.status_code())
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap()
    }
}

/// Acknowledgment returned for an authenticated webhook message.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    #[serde(rename = "type")]
    kind: &'static str,
    sender: String,
    length: usize,
}

#[tracing::instrument]
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo::new())
}

#[tracing::instrument(skip_all, fields(sender = %sender.identity(), body_len = body.len()))]
async fn webhook(Extension(sender): Extension<VerifiedSender>, body: Bytes) -> Json<WebhookAck> {
    Json(WebhookAck {
        kind: "message",
        sender: sender.identity().into(),
        length: body.len(),
    })
}

#[tracing::instrument(skip_all, fields(bind_ip = %config.bind_ip()))]
pub async fn start_server(config: Config, verifier: Verifier) -> color_eyre::Result<()> {
    let addr = SocketAddr::from_str(config.bind_ip())?;
    let app = build_http_router(Arc::new(verifier));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub(crate) fn build_http_router(verifier: Arc<Verifier>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .insert_response_header_if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

    Router::new()
        .route("/", get(root))
        .route(
            "/api/messages",
            post(webhook).layer(VerifyHmacSignatureLayer::new(verifier)),
        )
        .layer(middleware.into_inner())
}
