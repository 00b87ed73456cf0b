pub mod data_uri;
pub mod notify;
pub mod response;
