pub mod dto;
pub mod progress;
pub mod token;
pub mod transfer;

pub use dto::UploadResult;
pub use progress::UploadProgress;
pub use transfer::{ChunkTransfer, TransferError, CHUNK_SIZE};
