use log::debug;
use serde::{Deserialize, Serialize};

use crate::chart::ActiveNote;
use crate::gameplay::state::GameState;
use crate::gameplay::zones::{HitZone, ScoreTable, ZoneLayout};

/// Which note wins when several in one lane sit inside the zone stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSelection {
    /// First in active-list order.
    #[default]
    FirstMatch,
    /// Smallest distance to the target line.
    NearestToTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub note_id: String,
    pub lane: usize,
    pub value: String,
    pub instrument: u8,
    pub zone: HitZone,
    pub points: u32,
    /// Note position at the moment of the press.
    pub y: f64,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HitDetector {
    pub zones: ZoneLayout,
    pub scores: ScoreTable,
    pub selection: HitSelection,
}

impl HitDetector {
    pub fn new(zones: ZoneLayout, scores: ScoreTable, selection: HitSelection) -> Self {
        Self {
            zones,
            scores,
            selection,
        }
    }

    /// Judges a press in `lane`. A press with nothing in reach changes nothing.
    ///
    /// The hit note is only marked for removal; the game loop drops it on its
    /// next pass.
    pub fn on_lane_press(
        &self,
        state: &mut GameState,
        lane: usize,
        timestamp: f64,
    ) -> Option<HitResult> {
        if !state.is_playing() || lane >= state.lane_count() {
            return None;
        }

        let note = self.select(state, lane)?;
        let zone = self.zones.classify(note.y)?;
        let points = self.scores.points(zone);
        let result = HitResult {
            note_id: note.id.clone(),
            lane,
            value: note.note.value.clone(),
            instrument: note.note.instrument,
            zone,
            points,
            y: note.y,
            timestamp,
        };

        state.record_hit(zone, points);
        state.mark_note_for_removal(result.note_id.clone());
        debug!(
            "hit {} lane {} at y={:.1}: {:?} +{} (combo {})",
            result.note_id, lane, result.y, zone, points, state.combo
        );
        Some(result)
    }

    fn select<'a>(&self, state: &'a GameState, lane: usize) -> Option<&'a ActiveNote> {
        let mut candidates = state.active_notes.iter().filter(|n| {
            n.lane() == lane && self.zones.contains(n.y) && !state.is_pending_removal(&n.id)
        });

        match self.selection {
            HitSelection::FirstMatch => candidates.next(),
            HitSelection::NearestToTarget => {
                let target = self.zones.target_y();
                candidates.min_by(|a, b| {
                    (a.y - target).abs().total_cmp(&(b.y - target).abs())
                })
            }
        }
    }
}
