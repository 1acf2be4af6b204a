use serde::Serialize;

use crate::chart::ActiveNote;
use crate::gameplay::zones::LastHit;

/// What a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub active_notes: Vec<ActiveNote>,
    pub key_states: Vec<bool>,
    pub score: u64,
    pub combo: u32,
    pub last_hit_zone: Option<LastHit>,
    pub last_hit_points: u32,
    pub current_time: f64,
}

/// Receives each frame's snapshot. [`SessionRunner`](crate::gameplay::SessionRunner)
/// calls it after releasing the session lock.
pub trait FrameSink: Send {
    fn present(&mut self, snapshot: &FrameSnapshot);
}

impl<F> FrameSink for F
where
    F: FnMut(&FrameSnapshot) + Send,
{
    fn present(&mut self, snapshot: &FrameSnapshot) {
        self(snapshot)
    }
}
