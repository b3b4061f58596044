pub mod assets;
pub mod extractors;
pub mod snapshots;
