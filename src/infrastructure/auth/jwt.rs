use jsonwebtoken::{decode, Validation, TokenData, Algorithm};
use crate::entities::token::Claims;
use crate::settings::{AppConfig, JwtKeys};
use crate::errors::AuthError;

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Verifies identity tokens minted by the upstream auth service. This crate
/// never issues tokens.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
        }
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(AuthError::from)?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(data)
    }
}
