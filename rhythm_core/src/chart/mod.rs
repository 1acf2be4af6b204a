use serde::Serialize;

pub use chart_schema::{LaneMode, Note, NoteKey, Song, NOTE_TIME_EPSILON};

/// A chart note lifted into play.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveNote {
    /// Unique per spawn.
    pub id: String,
    #[serde(flatten)]
    pub note: Note,
    /// Scroll position in pixels, grows downward.
    pub y: f64,
}

impl ActiveNote {
    pub fn key(&self) -> NoteKey<'_> {
        self.note.key()
    }

    pub fn lane(&self) -> usize {
        self.note.position
    }
}

/// Hands out spawn ids; never repeats within one generator.
#[derive(Debug, Default)]
pub(crate) struct NoteIds {
    next: u64,
}

impl NoteIds {
    pub(crate) fn next_id(&mut self) -> String {
        self.next += 1;
        format!("note-{}", self.next)
    }
}
