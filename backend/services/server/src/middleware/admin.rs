use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error,
};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Lets a request through only when it carries the configured admin token.
/// With no token configured every admin request is refused.
pub struct AdminMiddleware {
    token: Option<Rc<str>>,
}

impl AdminMiddleware {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Rc::from),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
            token: self.token.clone(),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
    token: Option<Rc<str>>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(expected) = self.token.as_deref() else {
            return Box::pin(async {
                Err(ErrorForbidden(json!({
                    "status": "error",
                    "message": "Admin access is not configured"
                })))
            });
        };

        let provided = req
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected) {
            return Box::pin(async {
                Err(ErrorUnauthorized(json!({
                    "status": "error",
                    "message": "Invalid admin token"
                })))
            });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
