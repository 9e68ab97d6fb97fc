use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::{Body, Bytes, HttpBody},
    http::{header, Method, Request},
    response::{IntoResponse, Response},
};

use tower::{Layer, Service};

use crate::{
    auth::{AuthHeader, Verifier},
    error::ErrorCode,
};

/// Query parameter carrying the claimed sender identity.
const SENDER_ID_PARAMETER: &str = "id";

/// Largest body buffered for verification, in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024;

#[derive(Clone)]
pub struct VerifyHmacSignatureLayer {
    verifier: Arc<Verifier>,
    body_limit: usize,
}

impl VerifyHmacSignatureLayer {
    pub fn new(verifier: Arc<Verifier>) -> Self {
        Self {
            verifier,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl<S> Layer<S> for VerifyHmacSignatureLayer {
    type Service = VerifyHmacSignatureMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        VerifyHmacSignatureMiddleware::new(self.verifier.clone(), self.body_limit, inner)
    }
}

#[derive(Clone)]
pub struct VerifyHmacSignatureMiddleware<S> {
    verifier: Arc<Verifier>,
    body_limit: usize,
    inner: S,
}

impl<S> VerifyHmacSignatureMiddleware<S> {
    pub fn new(verifier: Arc<Verifier>, body_limit: usize, inner: S) -> Self {
        Self {
            verifier,
            body_limit,
            inner,
        }
    }
}

type BoxFuture<'a, Output> = Pin<Box<dyn Future<Output = Output> + Send + 'a>>;

fn claimed_sender<B>(request: &Request<B>) -> Option<String> {
    request.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == SENDER_ID_PARAMETER)
            .map(|(_, value)| value.into_owned())
    })
}

fn auth_header<B>(request: &Request<B>) -> Option<AuthHeader> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn declared_length<B>(request: &Request<B>) -> Option<usize> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Buffer the whole body, giving up as soon as it grows past `limit`.
async fn read_body(body: &mut Body, limit: usize) -> Result<Bytes, ErrorCode> {
    let mut buffer = Vec::<u8>::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| ErrorCode::UnreadableBody(e.to_string()))?;
        if buffer.len() + chunk.len() > limit {
            return Err(ErrorCode::PayloadTooLarge(limit));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.into())
}

impl<S> Service<Request<Body>> for VerifyHmacSignatureMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static + Clone,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let verifier = self.verifier.clone();
        let body_limit = self.body_limit;
        let fut = async move {
            if request.method() == Method::POST {
                let header = auth_header(&request);
                let sender = claimed_sender(&request);

                if declared_length(&request).filter(|len| *len > body_limit).is_some() {
                    return Ok(ErrorCode::PayloadTooLarge(body_limit).into_response());
                }

                let body = match read_body(request.body_mut(), body_limit).await {
                    Ok(b) => b,
                    Err(e) => return Ok(e.into_response()),
                };

                match verifier.verify(header.as_ref(), &body, sender.as_deref()) {
                    Ok(verified) => {
                        request.extensions_mut().insert(verified);
                    }
                    Err(e) => {
                        tracing::warn!(reason = %e, "rejected webhook request");
                        return Ok(ErrorCode::from(e).into_response());
                    }
                }

                *request.body_mut() = body.into();
            }

            let future = inner.call(request);
            let response: Response = future.await?;
            Ok(response)
        };

        Box::pin(fut)
    }
}
