use serde::{Deserialize, Serialize};

mod pitch;

pub use pitch::{Pitch, PitchParseError};

/// Two chart notes whose onsets differ by less than this many quarter notes
/// are the same note.
pub const NOTE_TIME_EPSILON: f64 = 1e-2;

/// Milliseconds per quarter note.
pub type Milliseconds = f64;

/// Onset in quarter-note units.
pub type QuarterNotes = f64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub name: String,
    pub quarter_note_duration: Milliseconds,
    pub notes: Vec<Note>,
}

impl Song {
    pub fn quarter_note_seconds(&self) -> f64 {
        self.quarter_note_duration / 1000.0
    }

    /// Song time in seconds at which `time` (quarter notes) is reached.
    pub fn seconds_at(&self, time: QuarterNotes) -> f64 {
        time * self.quarter_note_seconds()
    }

    pub fn duration_quarter_notes(&self) -> QuarterNotes {
        self.notes.iter().map(|n| n.time).fold(0.0, f64::max)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// Pitch name such as `C4`.
    pub value: String,
    /// Lane index.
    pub position: usize,
    /// Timbre selector for the hit cue.
    #[serde(default)]
    pub instrument: u8,
    pub time: QuarterNotes,
}

impl Note {
    pub fn key(&self) -> NoteKey<'_> {
        NoteKey {
            value: &self.value,
            position: self.position,
            time: self.time,
        }
    }

    pub fn pitch(&self) -> Option<Pitch> {
        self.value.parse().ok()
    }
}

/// Identity of a chart note before it has a spawn id.
///
/// Equal when value and lane match exactly and the onsets are within
/// [`NOTE_TIME_EPSILON`].
#[derive(Debug, Clone, Copy)]
pub struct NoteKey<'a> {
    pub value: &'a str,
    pub position: usize,
    pub time: QuarterNotes,
}

impl NoteKey<'_> {
    pub fn matches(&self, other: &NoteKey<'_>) -> bool {
        self.value == other.value
            && self.position == other.position
            && (self.time - other.time).abs() < NOTE_TIME_EPSILON
    }
}

impl PartialEq for NoteKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneMode {
    #[default]
    Four,
    Six,
}

impl LaneMode {
    pub fn lane_count(&self) -> usize {
        match self {
            LaneMode::Four => 4,
            LaneMode::Six => 6,
        }
    }

    /// Lane for a natural pitch letter.
    pub fn lane_for_letter(&self, letter: char) -> Option<usize> {
        let letter = letter.to_ascii_uppercase();
        match self {
            LaneMode::Four => match letter {
                'C' | 'G' => Some(0),
                'D' | 'A' => Some(1),
                'E' | 'B' => Some(2),
                'F' => Some(3),
                _ => None,
            },
            LaneMode::Six => match letter {
                'C' => Some(0),
                'D' => Some(1),
                'E' => Some(2),
                'F' => Some(3),
                'G' => Some(4),
                'A' | 'B' => Some(5),
                _ => None,
            },
        }
    }

    pub fn lane_for_pitch(&self, pitch: Pitch) -> usize {
        self.lane_for_letter(pitch.letter()).unwrap_or(0)
    }

    /// Keyboard keys in lane order.
    pub fn keys(&self) -> &'static [char] {
        match self {
            LaneMode::Four => &['D', 'F', 'J', 'K'],
            LaneMode::Six => &['S', 'D', 'F', 'J', 'K', 'L'],
        }
    }

    pub fn lane_for_key(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_uppercase();
        self.keys().iter().position(|k| *k == key)
    }
}
