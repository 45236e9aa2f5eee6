//! Per-frame input sources polled by the session loop.

pub mod live;
pub mod script;

use crate::models::input::FrameInput;

pub use live::LiveInput;
pub use script::ScriptedInput;

pub trait InputSource {
    /// Snapshot for the next frame. `None` once the source is exhausted.
    fn poll(&mut self) -> Option<FrameInput>;

    /// Moves the system pointer to a screen position.
    fn set_pointer(&mut self, x: f64, y: f64);
}
