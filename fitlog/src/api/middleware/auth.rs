//! API key authentication for administrative endpoints.

use std::sync::Arc;

use axum::{
    http::Request,
    response::{IntoResponse, Response},
};

use crate::api::error::ApiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Accepted API keys. An empty set disables the check.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuth {
    api_keys: Arc<Vec<String>>,
}

impl ApiKeyAuth {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }

    /// Check the request headers, yielding the rejection to send back.
    fn check<B>(&self, request: &Request<B>) -> Result<(), ApiError> {
        if !self.is_enabled() {
            return Ok(());
        }

        match request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some(key) if self.is_valid(key) => Ok(()),
            Some(_) => {
                tracing::warn!(path = %request.uri().path(), "Invalid API key provided");
                Err(ApiError::unauthorized("Invalid API key"))
            }
            None => {
                tracing::warn!(path = %request.uri().path(), "Missing API key in request");
                Err(ApiError::unauthorized("Missing API key"))
            }
        }
    }
}

/// Layer for API key authentication.
#[derive(Clone)]
pub struct ApiKeyAuthLayer {
    auth: ApiKeyAuth,
}

impl ApiKeyAuthLayer {
    pub fn new(auth: ApiKeyAuth) -> Self {
        Self { auth }
    }
}

impl<S> tower::Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuthService {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// Service for API key authentication.
#[derive(Clone)]
pub struct ApiKeyAuthService<S> {
    inner: S,
    auth: ApiKeyAuth,
}

impl<S, B> tower::Service<Request<B>> for ApiKeyAuthService<S>
where
    S: tower::Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        match self.auth.check(&request) {
            Ok(()) => Box::pin(self.inner.call(request)),
            Err(rejection) => Box::pin(async move { Ok(rejection.into_response()) }),
        }
    }
}
