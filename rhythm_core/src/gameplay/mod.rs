pub mod game_loop;
pub mod judge;
pub mod session;
pub mod state;
pub mod zones;

pub use game_loop::{FrameReport, GameLoop, LoopSettings};
pub use judge::{HitDetector, HitResult, HitSelection};
pub use session::{GameSession, SessionError, SessionRunner, SharedSession};
pub use state::{AccuracySummary, Difficulty, GameState, Phase};
pub use zones::{HitZone, LastHit, ScoreTable, ZoneClass, ZoneLayout};
