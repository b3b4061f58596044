use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{entities::token::Claims, errors::AuthError, AppState};

/// Gate in front of every store route. Requests carrying a valid HS512
/// bearer token continue with their [`Claims`] attached; everything else is
/// answered here with the matching [`AuthError`] response.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            match authorize(&req) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(rejection) => {
                    let response = rejection.error_response();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

/// Only the service banner is reachable without a token.
fn is_public_route(path: &str, method: &str) -> bool {
    method == "OPTIONS" || (path == "/" && method == "GET")
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' '))
        .then_some(token)
}

/// Verified claims for the request, or the rejection to send instead.
fn authorize(req: &ServiceRequest) -> Result<Claims, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState missing in middleware");
        return Err(AuthError::MissingJwtService);
    };

    let token = bearer_token(req).ok_or_else(|| {
        tracing::warn!(path = req.path(), "Request without bearer token");
        AuthError::MissingCredentials
    })?;

    let claims = state.token_service.decode_jwt(token).map_err(|e| {
        tracing::warn!(path = req.path(), error = %e, "Bearer token rejected");
        e
    })?
    .claims;

    if req.path().starts_with("/admin") && !claims.admin {
        tracing::warn!(path = req.path(), sub = %claims.sub, "Non-admin caller on admin route");
        return Err(AuthError::Forbidden("Admin access required".into()));
    }

    Ok(claims)
}
