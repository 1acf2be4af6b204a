use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use chart_schema::{LaneMode, Note, Song};
use crossbeam_channel::RecvTimeoutError;
use log::{debug, info};

mod error;
pub mod octave;
pub mod reader;

pub use error::{ImportError, ImportErrorKind};
pub use octave::{analyze, analyze_octaves, OctaveReport, OctaveStat};
pub use reader::{read_tracks, MidiFile, RawNote, RawTrack, TempoChange, TempoMap};

/// Raw onset seconds are multiplied by this to get chart quarter notes.
pub const DEFAULT_TIME_SCALE: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub name: Option<String>,
    pub min_octave: Option<i32>,
    pub max_octave: Option<i32>,
    /// Keep only the first note at each onset.
    pub melody_only: bool,
    pub time_scale: f64,
    /// Defaults to `1000 / time_scale`, which plays the chart at the file's own speed.
    pub quarter_note_duration_ms: Option<f64>,
    pub lane_mode: LaneMode,
    pub instrument: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            name: None,
            min_octave: None,
            max_octave: None,
            melody_only: true,
            time_scale: DEFAULT_TIME_SCALE,
            quarter_note_duration_ms: None,
            lane_mode: LaneMode::Four,
            instrument: 0,
        }
    }
}

impl ImportOptions {
    pub fn with_octave_range(mut self, min_octave: i32, max_octave: i32) -> Self {
        self.min_octave = Some(min_octave);
        self.max_octave = Some(max_octave);
        self
    }

    /// Uses the analyzer's recommended window as the octave filter.
    pub fn with_recommended_range(self, report: &OctaveReport) -> Self {
        self.with_octave_range(report.recommended_min_octave, report.recommended_max_octave)
    }

    fn octave_in_range(&self, octave: i32) -> bool {
        self.min_octave.map_or(true, |min| octave >= min)
            && self.max_octave.map_or(true, |max| octave <= max)
    }

    fn quarter_note_duration(&self) -> f64 {
        self.quarter_note_duration_ms
            .unwrap_or(1000.0 / self.time_scale)
    }
}

pub fn import_file(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Song, ImportError> {
    let path = path.as_ref();
    let bytes = read_file(path)?;

    let mut options = options.clone();
    if options.name.is_none() {
        options.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
    }

    import_bytes(&bytes, &options).map_err(|e| e.with_file(path.display().to_string()))
}

/// Same as [`import_file`], giving up after `timeout`.
///
/// The worker thread is detached on timeout and its result discarded.
pub fn import_file_with_timeout(
    path: impl AsRef<Path>,
    options: &ImportOptions,
    timeout: Duration,
) -> Result<Song, ImportError> {
    let options = options.clone();
    run_with_timeout(path.as_ref(), timeout, move |path| import_file(path, &options))
}

/// Same as [`analyze_file`], giving up after `timeout`.
pub fn analyze_file_with_timeout(
    path: impl AsRef<Path>,
    timeout: Duration,
) -> Result<OctaveReport, ImportError> {
    run_with_timeout(path.as_ref(), timeout, |path| analyze_file(path))
}

/// Runs `job` on a worker thread. A job that outlives `timeout` is E4001;
/// one that dies without answering is E1003.
fn run_with_timeout<T, F>(path: &Path, timeout: Duration, job: F) -> Result<T, ImportError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, ImportError> + Send + 'static,
{
    let path: PathBuf = path.to_path_buf();
    let (tx, rx) = crossbeam_channel::bounded(1);

    let worker_path = path.clone();
    thread::spawn(move || {
        let _ = tx.send(job(&worker_path));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ImportError::new(
            "E4001",
            format!("import did not finish within {} ms", timeout.as_millis()),
        )
        .with_file(path.display().to_string())),
        Err(RecvTimeoutError::Disconnected) => Err(ImportError::new(
            "E1003",
            "import worker stopped without a result",
        )
        .with_file(path.display().to_string())),
    }
}

pub fn import_bytes(bytes: &[u8], options: &ImportOptions) -> Result<Song, ImportError> {
    let midi = read_tracks(bytes)?;
    let track = midi.first_melodic_track().ok_or_else(ImportError::no_notes)?;
    let song = convert_track(track, options);
    info!(
        "imported track {} ({} of {} notes kept, {} ms per quarter note)",
        track.index,
        song.notes.len(),
        track.notes.len(),
        song.quarter_note_duration
    );
    Ok(song)
}

/// Converts one track into a chart. Notes outside the octave range are
/// dropped, never reported.
pub fn convert_track(track: &RawTrack, options: &ImportOptions) -> Song {
    let mut seen_onsets: HashSet<u64> = HashSet::new();
    let mut notes = Vec::with_capacity(track.notes.len());
    let mut out_of_range = 0usize;
    let mut collapsed = 0usize;

    for raw in &track.notes {
        let pitch = raw.pitch();
        if !options.octave_in_range(pitch.octave()) {
            out_of_range += 1;
            continue;
        }

        let time = raw.time * options.time_scale;
        if options.melody_only && !seen_onsets.insert(time.to_bits()) {
            collapsed += 1;
            continue;
        }

        notes.push(Note {
            value: pitch.name(),
            position: options.lane_mode.lane_for_pitch(pitch),
            instrument: options.instrument,
            time,
        });
    }

    if out_of_range > 0 || collapsed > 0 {
        debug!(
            "track {}: {out_of_range} notes outside octave range, {collapsed} simultaneous notes collapsed",
            track.index
        );
    }

    Song {
        name: options
            .name
            .clone()
            .or_else(|| track.name.clone())
            .unwrap_or_else(|| "Untitled".to_string()),
        quarter_note_duration: options.quarter_note_duration(),
        notes,
    }
}

/// Octave statistics for the track the importer would pick.
pub fn analyze_bytes(bytes: &[u8]) -> Result<OctaveReport, ImportError> {
    let midi = read_tracks(bytes)?;
    let track = midi.first_melodic_track().ok_or_else(ImportError::empty_track)?;
    analyze(track)
}

pub fn analyze_file(path: impl AsRef<Path>) -> Result<OctaveReport, ImportError> {
    let path = path.as_ref();
    let bytes = read_file(path)?;
    analyze_bytes(&bytes).map_err(|e| e.with_file(path.display().to_string()))
}

fn read_file(path: &Path) -> Result<Vec<u8>, ImportError> {
    fs::read(path).map_err(|e| {
        ImportError::new("E2001", format!("failed to read MIDI file: {e}"))
            .with_file(path.display().to_string())
    })
}
