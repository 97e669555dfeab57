use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpResponse};
use futures::future::{LocalBoxFuture, Ready, ok};
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::{debug, warn};

/// Environment variable holding the inbound API key. When unset, the guard
/// passes every request through.
pub const API_KEY_ENV: &str = "MAILGATE_API_KEY";

/// Bearer-key guard for the send endpoint. Health, introspection and static
/// paths stay public; `/send` requires `Authorization: Bearer <key>` once a
/// key is configured.
pub struct ApiKeyGuard {
    key: Option<Rc<String>>,
}

impl ApiKeyGuard {
    pub fn from_env() -> Self {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .map(Rc::new);
        Self { key }
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: Some(Rc::new(key.to_string())),
        }
    }

    pub fn disabled() -> Self {
        Self { key: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyGuardService {
            service: Rc::new(service),
            key: self.key.clone(),
        })
    }
}

pub struct ApiKeyGuardService<S> {
    service: Rc<S>,
    key: Option<Rc<String>>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        // Only the send endpoint is guarded
        let guarded = req.path() == "/send";

        let expected = match (&self.key, guarded) {
            (Some(key), true) => Rc::clone(key),
            _ => {
                let fut = service.call(req);
                return Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                });
            }
        };

        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if presented == Some(expected.as_str()) {
            debug!("API key accepted for {}", req.path());
            let fut = service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        } else {
            warn!(path = %req.path(), "rejected send request with missing or invalid API key");
            let (request, _) = req.into_parts();
            let response = HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": "missing or invalid API key" }));
            Box::pin(
                async move { Ok(ServiceResponse::new(request, response).map_into_right_body()) },
            )
        }
    }
}
