//! Request logging middleware.
//!
//! Logs one structured event per request with method, path, status, duration
//! and the authenticated user (when the handler resolved one). Each request
//! gets an id that is echoed back in the `x-request-id` response header.

use std::{
    future::{Ready, ready},
    rc::Rc,
    time::Instant,
};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;

use crate::{auth_middleware::UserContext, telemetry::request_id};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Default)]
pub struct RequestLoggingMiddleware;

impl RequestLoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLoggingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggingService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = request_id(req.headers().get(REQUEST_ID_HEADER));
        let method = req.method().to_string();
        let path = req.path().to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let status = response.status().as_u16();
            let user_id = response
                .request()
                .extensions()
                .get::<UserContext>()
                .map(|ctx| ctx.id);

            match status {
                500..=599 => tracing::error!(
                    request_id = %request_id, %method, %path, status, elapsed_ms, ?user_id,
                    "Request failed"
                ),
                400..=499 => tracing::warn!(
                    request_id = %request_id, %method, %path, status, elapsed_ms, ?user_id,
                    "Request rejected"
                ),
                _ => tracing::info!(
                    request_id = %request_id, %method, %path, status, elapsed_ms, ?user_id,
                    "Request completed"
                ),
            }

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(response)
        })
    }
}
