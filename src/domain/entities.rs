pub mod asset;
pub mod snapshot;
pub mod token;
