/// Handle to the native file input that fed the controller.
///
/// Clearing it lets the user pick the same file name again and still get a change event.
pub trait FilePicker: Send + Sync {
    fn clear(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFilePicker;

impl FilePicker for NoopFilePicker {
    fn clear(&self) {}
}
