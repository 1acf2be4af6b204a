use std::collections::BTreeMap;

use crate::reader::RawTrack;
use crate::ImportError;

/// Width of the recommended octave window.
pub const RECOMMENDED_SPAN: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveStat {
    pub octave: i32,
    pub count: usize,
    /// Share of all notes in the track, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OctaveReport {
    /// Ascending by octave; only octaves that occur.
    pub octave_stats: Vec<OctaveStat>,
    pub total_notes: usize,
    pub min_octave: i32,
    pub max_octave: i32,
    pub recommended_min_octave: i32,
    pub recommended_max_octave: i32,
}

impl OctaveReport {
    pub fn count(&self, octave: i32) -> usize {
        self.octave_stats
            .iter()
            .find(|s| s.octave == octave)
            .map_or(0, |s| s.count)
    }

    pub fn recommended_count(&self) -> usize {
        (self.recommended_min_octave..=self.recommended_max_octave)
            .map(|o| self.count(o))
            .sum()
    }
}

pub fn analyze(track: &RawTrack) -> Result<OctaveReport, ImportError> {
    analyze_octaves(track.notes.iter().map(|n| n.octave()))
        .map_err(|e| e.with_track(track.index))
}

/// Histogram and recommended window over a sequence of note octaves.
pub fn analyze_octaves(octaves: impl IntoIterator<Item = i32>) -> Result<OctaveReport, ImportError> {
    let mut histogram: BTreeMap<i32, usize> = BTreeMap::new();
    for octave in octaves {
        *histogram.entry(octave).or_default() += 1;
    }

    let total_notes: usize = histogram.values().sum();
    let (Some(&min_octave), Some(&max_octave)) =
        (histogram.keys().next(), histogram.keys().next_back())
    else {
        return Err(ImportError::empty_track());
    };

    let octave_stats = histogram
        .iter()
        .map(|(&octave, &count)| OctaveStat {
            octave,
            count,
            percentage: count as f64 / total_notes as f64 * 100.0,
        })
        .collect();

    let window_sum = |start: i32| -> usize {
        histogram
            .range(start..=(start + RECOMMENDED_SPAN - 1).min(max_octave))
            .map(|(_, c)| *c)
            .sum()
    };

    // Ascending starts with a strict comparison keep the lowest start on ties.
    let mut best_start = min_octave;
    let mut best_sum = window_sum(min_octave);
    for start in min_octave + 1..=max_octave {
        let sum = window_sum(start);
        if sum > best_sum {
            best_start = start;
            best_sum = sum;
        }
    }

    Ok(OctaveReport {
        octave_stats,
        total_notes,
        min_octave,
        max_octave,
        recommended_min_octave: best_start,
        recommended_max_octave: (best_start + RECOMMENDED_SPAN - 1).min(max_octave),
    })
}
