//! Caller hooks into a running upload
//!
//! Callbacks run synchronously on the uploader's thread. Every method has
//! a no-op default so callers only implement what they need.

use core::fmt;

use crate::session::SessionState;

/// Receives progress and log output, and may request cancellation
pub trait UploadObserver {
    /// Session entered `state` on the given 1-based attempt
    fn on_state(&mut self, _state: SessionState, _attempt: u8) {}

    /// `sent` of `total` image bytes acknowledged
    fn on_progress(&mut self, _sent: usize, _total: usize) {}

    /// One human-readable log line
    fn on_log(&mut self, _line: fmt::Arguments<'_>) {}

    /// Bytes that would be written, in order (simulation only)
    fn on_frame(&mut self, _bytes: &[u8]) {}

    /// Polled before every write; returning true aborts the upload
    fn cancel_requested(&mut self) -> bool {
        false
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

impl<O: UploadObserver + ?Sized> UploadObserver for &mut O {
    fn on_state(&mut self, state: SessionState, attempt: u8) {
        (**self).on_state(state, attempt)
    }

    fn on_progress(&mut self, sent: usize, total: usize) {
        (**self).on_progress(sent, total)
    }

    fn on_log(&mut self, line: fmt::Arguments<'_>) {
        (**self).on_log(line)
    }

    fn on_frame(&mut self, bytes: &[u8]) {
        (**self).on_frame(bytes)
    }

    fn cancel_requested(&mut self) -> bool {
        (**self).cancel_requested()
    }
}
