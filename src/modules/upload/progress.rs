use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub percent: u8,
    pub uploading: bool,
}

impl UploadProgress {
    pub const IDLE: Self = Self {
        percent: 0,
        uploading: false,
    };
}

/// Observable progress cell. Only the transfer writes to it.
#[derive(Debug)]
pub struct ProgressCell {
    tx: watch::Sender<UploadProgress>,
}

impl Default for ProgressCell {
    fn default() -> Self {
        Self {
            tx: watch::Sender::new(UploadProgress::IDLE),
        }
    }
}

impl ProgressCell {
    pub fn get(&self) -> UploadProgress {
        *self.tx.borrow()
    }

    pub fn set(&self, percent: u8, uploading: bool) {
        self.tx.send_replace(UploadProgress { percent, uploading });
    }

    pub fn reset(&self) {
        self.tx.send_replace(UploadProgress::IDLE);
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.tx.subscribe()
    }
}

/// Percentage after `index` (0-based) of `total` chunks.
///
/// Rounded up on purpose: three chunks must read 34, 67, 100, which nearest
/// rounding (33, 67, 100) does not give.
pub fn chunk_percent(index: u64, total: u64) -> u8 {
    let total = total.max(1);
    ((index + 1) * 100).div_ceil(total).min(100) as u8
}
