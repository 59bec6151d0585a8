// src/server/handler.rs
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::api::ApplicationsApi;
use crate::cancel::CancelHandle;

#[derive(Clone)]
pub struct RequestHandler {
    api: Arc<ApplicationsApi>,
    base_path: Arc<str>,
}

enum Route<'a> {
    List,
    Get(Cow<'a, str>),
}

impl RequestHandler {
    pub fn new(api: Arc<ApplicationsApi>, base_path: &str) -> Self {
        Self {
            api,
            base_path: Arc::from(base_path.trim_end_matches('/')),
        }
    }

    fn route<'a>(&self, path: &'a str) -> Option<Route<'a>> {
        let rest = path.strip_prefix(&*self.base_path)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next(), segments.next()) {
            (Some("applications"), None, None) => Some(Route::List),
            (Some("applications"), Some(name), None) => {
                // Names are matched decoded; invalid UTF-8 cannot name an application.
                percent_decode_str(name).decode_utf8().ok().map(Route::Get)
            }
            _ => None,
        }
    }

    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let route = match self.route(req.uri().path()) {
            // Routes only exist while at least one application is configured.
            Some(route) if self.api.has_applications() => route,
            _ => return text_response(StatusCode::NOT_FOUND, "Not Found"),
        };

        if req.method() != Method::GET {
            return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        // Dropped with this future when the client goes away, which cancels
        // every probe still in flight.
        let (_cancel, signal) = CancelHandle::new();

        match route {
            Route::List => {
                let reports = self.api.list(&signal).await;
                json_response(StatusCode::OK, &reports)
            }
            Route::Get(name) => match self.api.get(&name, &signal).await {
                Ok(report) => json_response(StatusCode::OK, &report),
                Err(not_found) => {
                    debug!(application = %name, "Application not found");
                    json_response(StatusCode::NOT_FOUND, &not_found)
                }
            },
        }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        let span = info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );
        Box::pin(async move { Ok(handler.handle(req).await) }.instrument(span))
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!(%e, "Failed to serialize response");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}
