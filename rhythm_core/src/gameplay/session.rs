use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use thiserror::Error;

use crate::audio::cue::{CueSink, HitCue, NullCueSink};
use crate::chart::{LaneMode, Song};
use crate::config::GameConfig;
use crate::gameplay::game_loop::{FrameReport, GameLoop};
use crate::gameplay::judge::{HitDetector, HitResult};
use crate::gameplay::state::{Difficulty, GameState};
use crate::input::events::InputEvent;
use crate::input::InputQueue;
use crate::render::{FrameSink, FrameSnapshot};
use crate::time::{FrameClock, FrameScheduler, LoopControl};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no song loaded")]
    NoSong,
    #[error("a frame loop is already running")]
    AlreadyRunning,
}

/// One player's game: chart, state, frame loop and hit detection.
pub struct GameSession {
    song: Option<Song>,
    lane_mode: LaneMode,
    pub state: GameState,
    pub game_loop: GameLoop,
    pub detector: HitDetector,
    cue: Box<dyn CueSink>,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_cue_sink(config, Box::new(NullCueSink))
    }

    pub fn with_cue_sink(config: &GameConfig, cue: Box<dyn CueSink>) -> Self {
        Self {
            song: None,
            lane_mode: config.lane_mode,
            state: GameState::new(config.lane_mode, config.difficulty),
            game_loop: GameLoop::new(config.loop_settings),
            detector: HitDetector::new(config.zones, config.scores, config.hit_selection),
            cue,
        }
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn lane_mode(&self) -> LaneMode {
        self.lane_mode
    }

    /// Swaps in a fully parsed chart and returns to the menu.
    pub fn load_song(&mut self, song: Song) {
        info!(
            "loaded {:?}: {} notes, {} ms per quarter note",
            song.name,
            song.notes.len(),
            song.quarter_note_duration
        );
        self.song = Some(song);
        self.reset_game();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.state.set_game_speed(difficulty);
    }

    pub fn start_game(&mut self) -> Result<(), SessionError> {
        if self.song.is_none() {
            return Err(SessionError::NoSong);
        }
        self.state.start_game();
        self.game_loop.restart();
        Ok(())
    }

    pub fn reset_game(&mut self) {
        self.state.reset_game();
        self.game_loop.restart();
    }

    /// `None` once the session has left the playing state.
    pub fn frame(&mut self, timestamp: f64) -> Option<FrameReport> {
        let song = self.song.as_ref()?;
        self.game_loop.tick(timestamp, song, &mut self.state)
    }

    /// Applies a key event. Keys outside the lane map are ignored.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<HitResult> {
        let lane = self.lane_mode.lane_for_key(event.key)?;
        self.state.set_key(lane, event.pressed);
        if event.pressed {
            self.press_lane(lane, event.timestamp)
        } else {
            None
        }
    }

    pub fn press_lane(&mut self, lane: usize, timestamp: f64) -> Option<HitResult> {
        let hit = self.detector.on_lane_press(&mut self.state, lane, timestamp)?;
        self.cue.trigger(HitCue::for_note(&hit.value, hit.instrument, hit.lane, timestamp));
        Some(hit)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            active_notes: self.state.active_notes.clone(),
            key_states: self.state.key_states.clone(),
            score: self.state.score,
            combo: self.state.combo,
            last_hit_zone: self.state.last_hit_zone,
            last_hit_points: self.state.last_hit_points,
            current_time: self.state.current_time,
        }
    }
}

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Drives a shared session from a [`FrameScheduler`].
///
/// Queued input is applied at the top of each frame, before the loop runs;
/// [`SessionRunner::press`] applies a key immediately from the caller's thread.
pub struct SessionRunner {
    session: SharedSession,
    scheduler: FrameScheduler,
    input: InputQueue,
}

impl SessionRunner {
    pub fn new(session: GameSession, config: &GameConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            scheduler: FrameScheduler::new(config.frame_interval()),
            input: InputQueue::new(),
        }
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Starts the game and its frame loop.
    pub fn start<C, S>(&mut self, clock: C, mut sink: S) -> Result<(), SessionError>
    where
        C: FrameClock + 'static,
        S: FrameSink + 'static,
    {
        if self.scheduler.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.session.lock().start_game()?;

        let session = Arc::clone(&self.session);
        let input = self.input.clone();
        let started = self.scheduler.start(clock, move |timestamp| {
            let snapshot = {
                let mut session = session.lock();
                for event in input.drain() {
                    session.handle_input(event);
                }
                match session.frame(timestamp) {
                    Some(_) => session.snapshot(),
                    None => return LoopControl::Stop,
                }
            };
            // Lock released before presenting.
            sink.present(&snapshot);
            LoopControl::Continue
        });
        if started {
            Ok(())
        } else {
            Err(SessionError::AlreadyRunning)
        }
    }

    pub fn press(&self, event: InputEvent) -> Option<HitResult> {
        self.session.lock().handle_input(event)
    }

    /// Halts the frame loop and returns the session to the menu.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.session.lock().reset_game();
    }
}
