use chart_schema::Pitch;
use midly::{Fps, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::ImportError;

/// 120 BPM, the MIDI default when no tempo event is present.
const DEFAULT_US_PER_QUARTER: f64 = 500_000.0;

/// A note onset read from a track, before any chart conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNote {
    pub key: u8,
    pub channel: u8,
    pub velocity: u8,
    pub tick: u64,
    /// Onset in seconds, tempo map applied.
    pub time: f64,
}

impl RawNote {
    pub fn pitch(&self) -> Pitch {
        Pitch::from_midi(self.key)
    }

    pub fn octave(&self) -> i32 {
        self.pitch().octave()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTrack {
    pub index: usize,
    pub name: Option<String>,
    /// Onsets in track order.
    pub notes: Vec<RawNote>,
}

#[derive(Debug, Clone)]
pub struct MidiFile {
    pub tracks: Vec<RawTrack>,
    pub tempo_map: TempoMap,
}

impl MidiFile {
    /// First track with at least one note; tracks with notes are treated as melodic.
    pub fn first_melodic_track(&self) -> Option<&RawTrack> {
        self.tracks.iter().find(|t| !t.notes.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Division {
    Metrical { ticks_per_quarter: f64 },
    Timecode { ticks_per_second: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: u64,
    pub us_per_quarter: f64,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.us_per_quarter
    }
}

/// Tick to seconds conversion over every tempo change in the file.
#[derive(Debug, Clone)]
pub struct TempoMap {
    division: Division,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    fn new(timing: Timing, mut changes: Vec<TempoChange>) -> Self {
        let division = match timing {
            Timing::Metrical(tpq) => Division::Metrical {
                ticks_per_quarter: tpq.as_int().max(1) as f64,
            },
            Timing::Timecode(fps, subframes) => {
                let fps = match fps {
                    Fps::Fps24 => 24.0,
                    Fps::Fps25 => 25.0,
                    Fps::Fps29 => 29.97,
                    Fps::Fps30 => 30.0,
                };
                Division::Timecode {
                    ticks_per_second: fps * subframes.max(1) as f64,
                }
            }
        };
        changes.sort_by_key(|c| c.tick);
        Self { division, changes }
    }

    pub fn initial_bpm(&self) -> f64 {
        self.changes
            .first()
            .filter(|c| c.tick == 0)
            .map(TempoChange::bpm)
            .unwrap_or(60_000_000.0 / DEFAULT_US_PER_QUARTER)
    }

    pub fn seconds_at(&self, tick: u64) -> f64 {
        let ticks_per_quarter = match self.division {
            Division::Timecode { ticks_per_second } => return tick as f64 / ticks_per_second,
            Division::Metrical { ticks_per_quarter } => ticks_per_quarter,
        };

        let mut seconds = 0.0;
        let mut last_tick = 0u64;
        let mut us_per_quarter = DEFAULT_US_PER_QUARTER;
        for change in &self.changes {
            if change.tick >= tick {
                break;
            }
            seconds += segment_seconds(change.tick - last_tick, us_per_quarter, ticks_per_quarter);
            last_tick = change.tick;
            us_per_quarter = change.us_per_quarter;
        }
        seconds + segment_seconds(tick - last_tick, us_per_quarter, ticks_per_quarter)
    }
}

fn segment_seconds(ticks: u64, us_per_quarter: f64, ticks_per_quarter: f64) -> f64 {
    ticks as f64 * us_per_quarter / ticks_per_quarter / 1_000_000.0
}

/// Parses a standard MIDI file into per-track onset lists.
pub fn read_tracks(bytes: &[u8]) -> Result<MidiFile, ImportError> {
    let smf = Smf::parse(bytes).map_err(ImportError::malformed)?;

    // Tempo events may sit on any track; collect them first so onsets in
    // every track share one map.
    let mut changes = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::Tempo(us)) = event.kind {
                changes.push(TempoChange {
                    tick,
                    us_per_quarter: us.as_int().max(1) as f64,
                });
            }
        }
    }
    let tempo_map = TempoMap::new(smf.header.timing, changes);

    let mut tracks = Vec::with_capacity(smf.tracks.len());
    for (index, track) in smf.tracks.iter().enumerate() {
        let mut tick = 0u64;
        let mut name = None;
        let mut notes = Vec::new();

        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(bytes)) if name.is_none() => {
                    let text = String::from_utf8_lossy(bytes).trim().to_string();
                    if !text.is_empty() {
                        name = Some(text);
                    }
                }
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key, vel },
                } if vel.as_int() > 0 => {
                    notes.push(RawNote {
                        key: key.as_int(),
                        channel: channel.as_int(),
                        velocity: vel.as_int(),
                        tick,
                        time: tempo_map.seconds_at(tick),
                    });
                }
                _ => {}
            }
        }

        tracks.push(RawTrack { index, name, notes });
    }

    Ok(MidiFile { tracks, tempo_map })
}
