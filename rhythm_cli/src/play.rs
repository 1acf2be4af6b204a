use std::io::Write;

use chart_schema::Song;
use log::debug;
use rhythm_core::config::GameConfig;
use rhythm_core::gameplay::{Difficulty, GameSession, HitZone, ZoneClass};
use rhythm_core::input::events::InputEvent;

/// Song time past the last onset after which autoplay gives up.
const OVERRUN_S: f64 = 30.0;

pub struct PlayOptions {
    pub fps: u32,
    pub difficulty: Option<Difficulty>,
    pub snapshots: bool,
}

/// Plays a chart on a virtual clock, pressing each lane as its note enters
/// the perfect band, and prints one row per frame that judged something.
pub fn autoplay(
    song: Song,
    config: &GameConfig,
    options: &PlayOptions,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if song.notes.is_empty() {
        writeln!(out, "Chart is empty.")?;
        return Ok(());
    }
    if options.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }

    let last_onset = song.seconds_at(song.duration_quarter_notes());
    let step_ms = 1000.0 / f64::from(options.fps);
    let press_y = config
        .zones
        .bands()
        .iter()
        .find(|(zone, _, _)| *zone == HitZone::Perfect)
        .map_or(config.zones.target_y(), |(_, top, _)| *top);

    let mut session = GameSession::new(config);
    session.load_song(song);
    if let Some(difficulty) = options.difficulty {
        session.set_difficulty(difficulty);
    }
    session.start_game()?;
    let keys = session.lane_mode().keys();

    writeln!(
        out,
        "Autoplay ({} fps, {:?}, last onset {:.3} s)",
        options.fps, session.state.game_speed, last_onset
    )?;
    let header: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    writeln!(out, "Time(ms) | {} | Info", header.join(" "))?;
    writeln!(out, "---------|-{}-|------------------", "-".repeat(keys.len() * 2 - 1))?;

    let mut t = 0.0;
    loop {
        let Some(report) = session.frame(t) else {
            break;
        };

        let mut lanes: Vec<usize> = session
            .state
            .active_notes
            .iter()
            .filter(|n| n.y >= press_y && !session.state.is_pending_removal(&n.id))
            .map(|n| n.lane())
            .filter(|lane| *lane < keys.len())
            .collect();
        lanes.sort_unstable();
        lanes.dedup();

        let mut cells = vec!['.'; keys.len()];
        let mut info = Vec::new();
        for lane in lanes {
            let key = keys[lane];
            if let Some(hit) = session.handle_input(InputEvent::press(key, t)) {
                cells[lane] = zone_char(hit.zone);
                info.push(format!("{} {:?} +{}", hit.value, hit.zone, hit.points));
            }
            session.handle_input(InputEvent::release(key, t));
        }
        if report.missed > 0 {
            info.push(format!("miss x{}", report.missed));
        }

        if !info.is_empty() {
            writeln!(
                out,
                "{:8.0} | {} | {}",
                t,
                cells.iter().map(char::to_string).collect::<Vec<_>>().join(" "),
                info.join(", ")
            )?;
        }
        if options.snapshots {
            writeln!(out, "{}", serde_json::to_string(&session.snapshot())?)?;
        }

        let time = session.state.current_time;
        let drained = time > last_onset && session.state.active_notes.is_empty();
        if drained || time > last_onset + OVERRUN_S {
            debug!("autoplay finished at {time:.3} s");
            break;
        }
        t += step_ms;
    }

    let summary = session.state.accuracy_summary();
    writeln!(out, "---")?;
    writeln!(out, "score: {}", session.state.score)?;
    writeln!(out, "max combo: {}", session.state.max_combo)?;
    writeln!(
        out,
        "perfect: {}  good: {}  normal: {}  missed: {}",
        summary.perfect, summary.good, summary.normal, summary.missed
    )?;
    Ok(())
}

fn zone_char(zone: HitZone) -> char {
    match zone.class() {
        ZoneClass::Perfect => 'P',
        ZoneClass::Good => 'G',
        ZoneClass::Normal => 'N',
    }
}
