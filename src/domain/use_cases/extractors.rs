use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use crate::{entities::token::Claims, errors::AuthError};

/// Caller identity verified by `AuthMiddleware`. Missing claims reject with 401.
#[derive(Debug)]
pub struct AuthClaims(pub Claims);

impl AuthClaims {
    /// The owner id every store operation is scoped to.
    pub fn owner_id(&self) -> &str {
        &self.0.sub
    }
}

/// Like [`AuthClaims`], but a non-admin caller is rejected with 403.
#[derive(Debug)]
pub struct AdminClaims(pub Claims);

fn verified_claims(req: &HttpRequest) -> Result<Claims, AuthError> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(AuthError::MissingCredentials)
}

impl FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(verified_claims(req).map(AuthClaims).map_err(Into::into))
    }
}

impl FromRequest for AdminClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = verified_claims(req).and_then(|claims| {
            if claims.admin {
                Ok(AdminClaims(claims))
            } else {
                Err(AuthError::Forbidden("Admin access required".into()))
            }
        });

        ready(result.map_err(Into::into))
    }
}
