use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::chart::{ActiveNote, NoteIds, Song};
use crate::gameplay::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Where a note appears, above the visible arena.
    pub spawn_y: f64,
    /// Bottom edge of the arena.
    pub end_y: f64,
    /// Extra distance past `end_y` before a note counts as missed.
    pub miss_buffer: f64,
    /// Upper bound on the per-frame step in seconds, so a stalled frame
    /// source cannot teleport notes.
    pub max_frame_delta_s: f64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            spawn_y: -50.0,
            end_y: 800.0,
            miss_buffer: 50.0,
            max_frame_delta_s: 0.1,
        }
    }
}

impl LoopSettings {
    pub fn miss_line(&self) -> f64 {
        self.end_y + self.miss_buffer
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub song_time: f64,
    pub delta_time: f64,
    pub spawned: usize,
    pub removed: usize,
    pub missed: usize,
}

/// Advances one session frame by frame: spawns due notes, scrolls them and
/// expires the ones that fall past the miss line.
///
/// Keeps its own copy of the active list; if the state's list turns up empty
/// while the copy is not, the copy wins.
#[derive(Debug)]
pub struct GameLoop {
    pub settings: LoopSettings,
    start_time: Option<f64>,
    last_frame_time: f64,
    session: Option<u64>,
    shadow: Vec<ActiveNote>,
    /// Chart indices already spawned or found to be duplicates.
    consumed: Vec<bool>,
    /// Fingerprint of the chart `consumed` was built for.
    chart: Option<u64>,
    ids: NoteIds,
}

impl GameLoop {
    pub fn new(settings: LoopSettings) -> Self {
        Self {
            settings,
            start_time: None,
            last_frame_time: 0.0,
            session: None,
            shadow: Vec::new(),
            consumed: Vec::new(),
            chart: None,
            ids: NoteIds::default(),
        }
    }

    /// Forgets the latched start time; the next frame starts the song over.
    pub fn restart(&mut self) {
        self.start_time = None;
        self.session = None;
        self.shadow.clear();
        self.consumed.clear();
        self.chart = None;
    }

    pub fn is_latched(&self) -> bool {
        self.start_time.is_some()
    }

    /// Runs one frame at `timestamp` (milliseconds). Returns `None` without
    /// touching anything when the state is not playing.
    ///
    /// Swapping `song` mid-session keeps the clock running; notes of the new
    /// chart spawn unless an identical note was already spawned.
    pub fn tick(&mut self, timestamp: f64, song: &Song, state: &mut GameState) -> Option<FrameReport> {
        if !state.is_playing() {
            return None;
        }

        if self.session != Some(state.session()) {
            self.restart();
            self.session = Some(state.session());
        }
        let start_time = match self.start_time {
            Some(start) => start,
            None => {
                self.start_time = Some(timestamp);
                self.last_frame_time = timestamp;
                timestamp
            }
        };
        let chart = chart_fingerprint(song);
        if self.chart != Some(chart) {
            self.chart = Some(chart);
            self.consumed = vec![false; song.notes.len()];
        }

        let song_time = (timestamp - start_time) / 1000.0;
        state.current_time = song_time;

        let delta_time =
            ((timestamp - self.last_frame_time) / 1000.0).clamp(0.0, self.settings.max_frame_delta_s);
        self.last_frame_time = timestamp;

        let mut report = FrameReport {
            song_time,
            delta_time,
            ..FrameReport::default()
        };

        let quarter_seconds = song.quarter_note_seconds();
        if !(quarter_seconds > 0.0) {
            warn!("song {:?} has no usable tempo; nothing will scroll", song.name);
            return Some(report);
        }
        let current_quarter = song_time / quarter_seconds;
        let speed = state.pixels_per_quarter_note() / quarter_seconds;

        let mut active = self.reconcile(state);

        for note in active.iter_mut() {
            note.y += speed * delta_time;
        }

        for (index, note) in song.notes.iter().enumerate() {
            if self.consumed[index] || note.time > current_quarter {
                continue;
            }
            self.consumed[index] = true;

            let key = note.key();
            let seen = state.notes.iter().any(|n| n.key().matches(&key))
                || active.iter().any(|n| n.key().matches(&key));
            if seen {
                continue;
            }

            // Place the note where it would be had it spawned exactly on its
            // onset, bounded by this frame's step.
            let late = (song_time - note.time * quarter_seconds).clamp(0.0, delta_time);
            let spawned = ActiveNote {
                id: self.ids.next_id(),
                note: note.clone(),
                y: self.settings.spawn_y + speed * late,
            };
            debug!("spawn {} {} lane {} at q={:.2}", spawned.id, note.value, note.position, note.time);
            state.notes.push(spawned.clone());
            active.push(spawned);
            report.spawned += 1;
        }

        let miss_line = self.settings.miss_line();
        active.retain(|note| {
            if state.pending_note_removals.contains(&note.id) {
                report.removed += 1;
                false
            } else if note.y > miss_line {
                debug!("miss {} lane {}", note.id, note.lane());
                report.missed += 1;
                false
            } else {
                true
            }
        });
        state.clear_pending_removals();

        self.shadow = active.clone();
        state.active_notes = active;

        if report.missed > 0 {
            state.record_misses(report.missed as u32);
        }

        Some(report)
    }

    fn reconcile(&mut self, state: &mut GameState) -> Vec<ActiveNote> {
        if state.active_notes.is_empty() && !self.shadow.is_empty() {
            warn!(
                "active list was emptied outside the loop; restoring {} notes",
                self.shadow.len()
            );
            return std::mem::take(&mut self.shadow);
        }
        std::mem::take(&mut state.active_notes)
    }
}

fn chart_fingerprint(song: &Song) -> u64 {
    let mut hasher = DefaultHasher::new();
    song.quarter_note_duration.to_bits().hash(&mut hasher);
    for note in &song.notes {
        note.value.hash(&mut hasher);
        note.position.hash(&mut hasher);
        note.time.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(LoopSettings::default())
    }
}
