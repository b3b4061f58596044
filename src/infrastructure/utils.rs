pub mod data_uri;
pub mod valid_id;
