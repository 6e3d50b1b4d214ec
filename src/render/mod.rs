mod camera;
pub mod pick;

pub use camera::CameraController;
pub use pick::{CursorStyle, PickController, PickEvent, PickPhase, PickState, DEFAULT_HOVER_SCALE};
