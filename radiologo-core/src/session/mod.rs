//! Upload session
//!
//! One [`Uploader`] call runs up to `retries + 1` sessions. Each session
//! walks the states in [`SessionState`] exactly once and always closes the
//! transport on the way out.

pub mod events;
pub mod retry;
pub mod state;
pub mod timing;
pub mod uploader;

mod reader;
mod simulate;

pub use events::SessionEvent;
pub use retry::RetryPolicy;
pub use simulate::frame_stream;
pub use state::SessionState;
pub use timing::TimingProfile;
pub use uploader::{UploadReport, Uploader};
