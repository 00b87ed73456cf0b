use std::sync::Arc;

use crate::infrastructure::media::MediaProbe;
use crate::modules::ingest::{FilePicker, VideoIngestController};
use crate::modules::upload::ChunkTransfer;
use crate::state::AppState;

pub fn create_controller(
    state: &AppState,
    picker: Arc<dyn FilePicker>,
    probe: Arc<dyn MediaProbe>,
) -> Arc<VideoIngestController> {
    let transfer = Arc::new(ChunkTransfer::new(state.api.clone(), state.notifier.clone()));

    Arc::new(VideoIngestController::new(
        transfer,
        state.api.clone(),
        state.notifier.clone(),
        picker,
        probe,
        state.config.thumbnail_settle_delay(),
    ))
}
