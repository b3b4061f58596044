pub mod atomic_file;
pub mod blob_store;
