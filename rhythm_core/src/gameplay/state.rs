use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::chart::{ActiveNote, LaneMode};
use crate::gameplay::zones::{HitZone, LastHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menu,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Scroll distance of one quarter note, in pixels.
    pub fn pixels_per_quarter_note(&self) -> f64 {
        match self {
            Difficulty::Easy => 200.0,
            Difficulty::Normal => 300.0,
            Difficulty::Hard => 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccuracySummary {
    pub perfect: u32,
    pub good: u32,
    pub normal: u32,
    pub missed: u32,
}

impl AccuracySummary {
    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.normal + self.missed
    }
}

/// Mutable state of one play session.
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: Phase,
    /// Song time in seconds.
    pub current_time: f64,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Every note spawned this session.
    pub notes: Vec<ActiveNote>,
    pub active_notes: Vec<ActiveNote>,
    pub key_states: Vec<bool>,
    pub last_hit_zone: Option<LastHit>,
    pub last_hit_points: u32,
    pub missed_notes_count: u32,
    pub pending_note_removals: HashSet<String>,
    pub game_speed: Difficulty,
    hit_counts: [u32; 5],
    session: u64,
}

impl GameState {
    pub fn new(lane_mode: LaneMode, game_speed: Difficulty) -> Self {
        Self {
            phase: Phase::Menu,
            current_time: 0.0,
            score: 0,
            combo: 0,
            max_combo: 0,
            notes: Vec::new(),
            active_notes: Vec::new(),
            key_states: vec![false; lane_mode.lane_count()],
            last_hit_zone: None,
            last_hit_points: 0,
            missed_notes_count: 0,
            pending_note_removals: HashSet::new(),
            game_speed,
            hit_counts: [0; 5],
            session: 0,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.key_states.len()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Bumped by every start or reset; a game loop that sees a new value restarts its clock.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn start_game(&mut self) {
        self.clear_session();
        self.phase = Phase::Playing;
        info!("game started (session {}, {:?})", self.session, self.game_speed);
    }

    pub fn reset_game(&mut self) {
        self.clear_session();
        self.phase = Phase::Menu;
        info!("game reset (session {})", self.session);
    }

    fn clear_session(&mut self) {
        self.session += 1;
        self.current_time = 0.0;
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.notes.clear();
        self.active_notes.clear();
        self.key_states.iter_mut().for_each(|k| *k = false);
        self.last_hit_zone = None;
        self.last_hit_points = 0;
        self.missed_notes_count = 0;
        self.pending_note_removals.clear();
        self.hit_counts = [0; 5];
    }

    pub fn set_game_speed(&mut self, speed: Difficulty) {
        self.game_speed = speed;
    }

    pub fn pixels_per_quarter_note(&self) -> f64 {
        self.game_speed.pixels_per_quarter_note()
    }

    pub fn set_key(&mut self, lane: usize, pressed: bool) {
        if let Some(state) = self.key_states.get_mut(lane) {
            *state = pressed;
        }
    }

    pub fn mark_note_for_removal(&mut self, id: impl Into<String>) {
        self.pending_note_removals.insert(id.into());
    }

    pub fn is_pending_removal(&self, id: &str) -> bool {
        self.pending_note_removals.contains(id)
    }

    pub fn clear_pending_removals(&mut self) {
        self.pending_note_removals.clear();
    }

    /// Collapses active notes sharing an id or a note key; the first one stays.
    /// Returns how many were dropped.
    pub fn cleanup_notes(&mut self) -> usize {
        let before = self.active_notes.len();
        let mut kept: Vec<ActiveNote> = Vec::with_capacity(before);
        for note in self.active_notes.drain(..) {
            let duplicate = kept
                .iter()
                .any(|k| k.id == note.id || k.key().matches(&note.key()));
            if !duplicate {
                kept.push(note);
            }
        }
        self.active_notes = kept;

        let dropped = before - self.active_notes.len();
        if dropped > 0 {
            debug!("cleanup dropped {dropped} duplicate active notes");
        }
        dropped
    }

    pub fn record_hit(&mut self, zone: HitZone, points: u32) {
        self.score += points as u64;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.last_hit_zone = Some(LastHit::Hit(zone));
        self.last_hit_points = points;
        self.hit_counts[zone.index()] += 1;
    }

    /// Applies the misses of one frame: combo breaks once however many expired.
    pub fn record_misses(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.missed_notes_count += count;
        self.combo = 0;
        self.last_hit_zone = Some(LastHit::Missed);
        self.last_hit_points = 0;
    }

    pub fn hit_count(&self, zone: HitZone) -> u32 {
        self.hit_counts[zone.index()]
    }

    pub fn accuracy_summary(&self) -> AccuracySummary {
        AccuracySummary {
            perfect: self.hit_count(HitZone::Perfect),
            good: self.hit_count(HitZone::EarlyGood) + self.hit_count(HitZone::LateGood),
            normal: self.hit_count(HitZone::EarlyNormal) + self.hit_count(HitZone::LateNormal),
            missed: self.missed_notes_count,
        }
    }
}
