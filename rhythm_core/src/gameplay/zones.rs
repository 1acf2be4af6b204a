use serde::{Deserialize, Serialize};

/// Precision bands, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitZone {
    EarlyNormal,
    EarlyGood,
    Perfect,
    LateGood,
    LateNormal,
}

impl HitZone {
    pub const ALL: [HitZone; 5] = [
        HitZone::EarlyNormal,
        HitZone::EarlyGood,
        HitZone::Perfect,
        HitZone::LateGood,
        HitZone::LateNormal,
    ];

    pub fn class(&self) -> ZoneClass {
        match self {
            HitZone::Perfect => ZoneClass::Perfect,
            HitZone::EarlyGood | HitZone::LateGood => ZoneClass::Good,
            HitZone::EarlyNormal | HitZone::LateNormal => ZoneClass::Normal,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            HitZone::EarlyNormal => 0,
            HitZone::EarlyGood => 1,
            HitZone::Perfect => 2,
            HitZone::LateGood => 3,
            HitZone::LateNormal => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneClass {
    Perfect,
    Good,
    Normal,
}

/// Feedback for the most recent judged note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastHit {
    Hit(HitZone),
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub perfect: u32,
    pub good: u32,
    pub normal: u32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            perfect: 300,
            good: 200,
            normal: 100,
        }
    }
}

impl ScoreTable {
    pub fn points(&self, zone: HitZone) -> u32 {
        match zone.class() {
            ZoneClass::Perfect => self.perfect,
            ZoneClass::Good => self.good,
            ZoneClass::Normal => self.normal,
        }
    }
}

/// Five contiguous bands stacked downward from `start`.
///
/// With mirrored early/late heights the target line is the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    pub start: f64,
    /// Heights in [`HitZone::ALL`] order.
    pub heights: [f64; 5],
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self::symmetric(600.0, 50.0, 40.0, 20.0)
    }
}

impl ZoneLayout {
    pub fn symmetric(start: f64, normal: f64, good: f64, perfect: f64) -> Self {
        Self {
            start,
            heights: [normal, good, perfect, good, normal],
        }
    }

    pub fn total_height(&self) -> f64 {
        self.heights.iter().sum()
    }

    pub fn end(&self) -> f64 {
        self.start + self.total_height()
    }

    pub fn target_y(&self) -> f64 {
        self.start + self.total_height() / 2.0
    }

    pub fn contains(&self, y: f64) -> bool {
        y >= self.start && y <= self.end()
    }

    /// `(zone, top, bottom)` for every band.
    pub fn bands(&self) -> [(HitZone, f64, f64); 5] {
        let mut top = self.start;
        HitZone::ALL.map(|zone| {
            let bottom = top + self.heights[zone.index()];
            let band = (zone, top, bottom);
            top = bottom;
            band
        })
    }

    /// Band containing `y`. Bands are half-open except the last, which
    /// includes the stack's bottom edge.
    pub fn classify(&self, y: f64) -> Option<HitZone> {
        if !self.contains(y) {
            return None;
        }
        self.bands()
            .iter()
            .find(|(_, _, bottom)| y < *bottom)
            .map(|(zone, _, _)| *zone)
            .or(Some(HitZone::LateNormal))
    }

    pub fn is_symmetric(&self) -> bool {
        self.heights[0] == self.heights[4] && self.heights[1] == self.heights[3]
    }
}
