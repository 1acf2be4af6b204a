pub mod clock;
pub mod scheduler;

pub use clock::{FrameClock, SystemClock, VirtualClock};
pub use scheduler::{CancelToken, FrameScheduler, LoopControl};
