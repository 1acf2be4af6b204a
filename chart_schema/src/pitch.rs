use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pitch name: {0:?}")]
pub struct PitchParseError(pub String);

/// A pitch in scientific notation. `C4` is MIDI key 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    key: u8,
}

impl Pitch {
    pub fn from_midi(key: u8) -> Self {
        Self { key: key.min(127) }
    }

    pub fn midi(&self) -> u8 {
        self.key
    }

    pub fn octave(&self) -> i32 {
        self.key as i32 / 12 - 1
    }

    /// Natural letter of the pitch, with any sharp stripped (`C#` -> `C`).
    pub fn letter(&self) -> char {
        SHARP_NAMES[(self.key % 12) as usize]
            .chars()
            .next()
            .unwrap_or('C')
    }

    pub fn name(&self) -> String {
        format!("{}{}", SHARP_NAMES[(self.key % 12) as usize], self.octave())
    }

    /// Equal temperament, A4 = 440 Hz.
    pub fn frequency_hz(&self) -> f64 {
        440.0 * 2f64.powf((self.key as f64 - 69.0) / 12.0)
    }

    pub fn transposed(&self, semitones: i32) -> Self {
        Self::from_midi((self.key as i32 + semitones).clamp(0, 127) as u8)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Pitch {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PitchParseError(s.to_string());
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(err)?.to_ascii_uppercase();
        let base: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(err()),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };
        let octave: i32 = octave_str.parse().map_err(|_| err())?;
        let key = (octave + 1) * 12 + base + accidental;
        if !(0..=127).contains(&key) {
            return Err(err());
        }
        Ok(Self { key: key as u8 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_is_key_60() {
        let c4: Pitch = "C4".parse().unwrap();
        assert_eq!(c4.midi(), 60);
        assert_eq!(c4.octave(), 4);
        assert_eq!(Pitch::from_midi(60).name(), "C4");
    }

    #[test]
    fn sharps_and_flats_resolve_to_the_same_key() {
        let sharp: Pitch = "F#3".parse().unwrap();
        let flat: Pitch = "Gb3".parse().unwrap();
        assert_eq!(sharp, flat);
        assert_eq!(sharp.letter(), 'F');
        assert_eq!(sharp.name(), "F#3");
    }

    #[test]
    fn negative_octave_parses() {
        let p: Pitch = "C-1".parse().unwrap();
        assert_eq!(p.midi(), 0);
        assert_eq!(p.octave(), -1);
    }

    #[test]
    fn a4_is_440() {
        let a4: Pitch = "A4".parse().unwrap();
        assert!((a4.frequency_hz() - 440.0).abs() < 1e-9);
        assert!((a4.transposed(12).frequency_hz() - 880.0).abs() < 1e-9);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("".parse::<Pitch>().is_err());
        assert!("G9".parse::<Pitch>().is_ok());
        assert!("A9".parse::<Pitch>().is_err());
    }
}
