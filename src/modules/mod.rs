pub mod ingest;
pub mod upload;
