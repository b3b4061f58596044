use serde::{Serialize, Deserialize};

/// Identity resolved by the upstream auth service. `sub` is the owner id
/// every store operation is scoped to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub admin: bool,
    pub exp: usize,
    pub iat: usize,
}
