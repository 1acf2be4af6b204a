use chart_schema::Pitch;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Each instrument step raises the cue by this many semitones.
pub const INSTRUMENT_SEMITONES: i32 = 12;

/// Fallback when a note value is not a pitch name.
const DEFAULT_PITCH: u8 = 69;

/// Short tone to play for a hit. Synthesis is up to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct HitCue {
    pub lane: usize,
    pub instrument: u8,
    pub frequency_hz: f64,
    pub timestamp: f64,
}

impl HitCue {
    pub fn for_note(value: &str, instrument: u8, lane: usize, timestamp: f64) -> Self {
        let pitch = value
            .parse::<Pitch>()
            .unwrap_or_else(|_| Pitch::from_midi(DEFAULT_PITCH));
        Self {
            lane,
            instrument,
            frequency_hz: pitch
                .transposed(instrument as i32 * INSTRUMENT_SEMITONES)
                .frequency_hz(),
            timestamp,
        }
    }
}

pub trait CueSink: Send {
    fn trigger(&self, cue: HitCue);
}

pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn trigger(&self, _cue: HitCue) {}
}

/// Forwards cues to whatever owns the receiving end, typically an audio thread.
#[derive(Clone)]
pub struct ChannelCueSink {
    tx: Sender<HitCue>,
}

impl ChannelCueSink {
    pub fn new() -> (Self, Receiver<HitCue>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl CueSink for ChannelCueSink {
    fn trigger(&self, cue: HitCue) {
        let _ = self.tx.send(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_raises_the_cue_an_octave() {
        let base = HitCue::for_note("A4", 0, 1, 0.0);
        let raised = HitCue::for_note("A4", 1, 1, 0.0);
        assert!((base.frequency_hz - 440.0).abs() < 1e-9);
        assert!((raised.frequency_hz - 880.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_value_falls_back_to_a4() {
        let cue = HitCue::for_note("kick", 0, 0, 0.0);
        assert!((cue.frequency_hz - 440.0).abs() < 1e-9);
    }

    #[test]
    fn channel_sink_delivers_in_order() {
        let (sink, rx) = ChannelCueSink::new();
        sink.trigger(HitCue::for_note("C4", 0, 0, 1.0));
        sink.trigger(HitCue::for_note("D4", 0, 1, 2.0));

        let received: Vec<usize> = rx.try_iter().map(|c| c.lane).collect();
        assert_eq!(received, vec![0, 1]);
    }
}
