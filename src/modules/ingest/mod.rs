pub mod controller;
pub mod dto;
pub mod duration;
pub mod picker;
pub mod state;
pub mod thumbnails;

pub use controller::VideoIngestController;
pub use dto::FileSelection;
pub use duration::format_duration;
pub use picker::{FilePicker, NoopFilePicker};
pub use state::{IngestPhase, IngestState};
