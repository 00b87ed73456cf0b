pub mod http;
pub mod media;
