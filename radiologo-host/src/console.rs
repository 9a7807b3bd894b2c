//! Console observer
//!
//! Turns upload callbacks into log lines and optionally writes the
//! simulated frame stream to a file.

use std::fmt;
use std::io::{self, Write};

use log::{debug, info};
use radiologo_core::{SessionState, UploadObserver};

/// Logs progress and collects simulated frames into `W`
pub struct ConsoleObserver<W> {
    frames: Option<W>,
    frame_count: usize,
    frame_error: Option<io::Error>,
    last_decile: Option<usize>,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(frames: Option<W>) -> Self {
        Self {
            frames,
            frame_count: 0,
            frame_error: None,
            last_decile: None,
        }
    }

    /// Flush the frame sink and report how many frames it received
    pub fn finish(self) -> io::Result<usize> {
        if let Some(e) = self.frame_error {
            return Err(e);
        }
        if let Some(mut sink) = self.frames {
            sink.flush()?;
        }
        Ok(self.frame_count)
    }
}

impl<W: Write> UploadObserver for ConsoleObserver<W> {
    fn on_state(&mut self, state: SessionState, attempt: u8) {
        debug!("attempt {}: {}", attempt, state);
    }

    fn on_progress(&mut self, sent: usize, total: usize) {
        if total == 0 {
            return;
        }
        let decile = sent * 10 / total;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            info!("sent {}/{} bytes ({}%)", sent, total, decile * 10);
        }
    }

    fn on_log(&mut self, line: fmt::Arguments<'_>) {
        info!("{}", line);
    }

    fn on_frame(&mut self, bytes: &[u8]) {
        self.frame_count += 1;
        if self.frame_error.is_some() {
            return;
        }
        if let Some(sink) = self.frames.as_mut() {
            if let Err(e) = sink.write_all(bytes) {
                self.frame_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frames_concatenated() {
        let mut observer = ConsoleObserver::new(Some(Vec::new()));
        observer.on_frame(&[1, 2]);
        observer.on_frame(&[3]);
        assert_eq!(observer.frames.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(observer.finish().unwrap(), 2);
    }

    #[test]
    fn test_frames_counted_without_sink() {
        let mut observer = ConsoleObserver::<Vec<u8>>::new(None);
        observer.on_frame(&[0xA5]);
        assert_eq!(observer.finish().unwrap(), 1);
    }

    #[test]
    fn test_write_error_surfaces_on_finish() {
        let mut observer = ConsoleObserver::new(Some(Broken));
        observer.on_frame(&[0xA5]);
        observer.on_frame(&[0xA5]);
        assert!(observer.finish().is_err());
    }

    #[test]
    fn test_progress_logged_per_decile() {
        let mut observer = ConsoleObserver::<Vec<u8>>::new(None);
        observer.on_progress(0, 40960);
        observer.on_progress(1024, 40960);
        assert_eq!(observer.last_decile, Some(0));
        observer.on_progress(40960, 40960);
        assert_eq!(observer.last_decile, Some(10));
    }
}
