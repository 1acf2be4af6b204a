use std::collections::{HashMap, HashSet};

use rhythm_core::chart::{LaneMode, Note, Song};
use rhythm_core::gameplay::{Difficulty, GameLoop, GameState, LastHit, LoopSettings};

fn note(value: &str, position: usize, time: f64) -> Note {
    Note {
        value: value.to_string(),
        position,
        instrument: 0,
        time,
    }
}

fn song(quarter_note_duration: f64, notes: Vec<Note>) -> Song {
    Song {
        name: "test".to_string(),
        quarter_note_duration,
        notes,
    }
}

fn playing() -> GameState {
    let mut state = GameState::new(LaneMode::Four, Difficulty::Normal);
    state.start_game();
    state
}

/// Ticks from 0 to `end_ms` with the given step pattern; returns the y of
/// every active note by value at the end.
fn run(song: &Song, steps: &[f64], end_ms: f64) -> HashMap<String, f64> {
    let mut game_loop = GameLoop::default();
    let mut state = playing();
    let mut t = 0.0;
    game_loop.tick(t, song, &mut state).unwrap();
    let mut i = 0;
    while t < end_ms {
        t += steps[i % steps.len()].min(end_ms - t);
        game_loop.tick(t, song, &mut state).unwrap();
        i += 1;
    }
    state
        .active_notes
        .iter()
        .map(|n| (n.note.value.clone(), n.y))
        .collect()
}

#[test]
fn first_frame_latches_and_spawns_above_the_arena() {
    let chart = song(500.0, vec![note("D4", 1, 0.0), note("E4", 2, 4.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = playing();

    let report = game_loop.tick(12_345.0, &chart, &mut state).unwrap();
    assert_eq!(report.song_time, 0.0);
    assert_eq!(report.delta_time, 0.0);
    assert_eq!(report.spawned, 1);
    assert_eq!(state.active_notes.len(), 1);
    assert_eq!(state.active_notes[0].y, -50.0);
    assert_eq!(state.notes.len(), 1);

    let report = game_loop.tick(12_845.0, &chart, &mut state).unwrap();
    assert!((report.song_time - 0.5).abs() < 1e-12);
    assert!((state.current_time - 0.5).abs() < 1e-12);
}

#[test]
fn chart_notes_spawn_at_most_once() {
    let chart = song(
        500.0,
        vec![
            note("C4", 0, 0.0),
            note("C4", 0, 0.5),
            note("C4", 0, 0.5),
            note("C4", 0, 0.504),
            note("E4", 2, 1.0),
            note("F4", 3, 1.0),
            note("G4", 0, 2.25),
        ],
    );
    let distinct = 5;

    let mut game_loop = GameLoop::default();
    let mut state = playing();
    let steps = [16.0, 33.0, 7.0, 40.0, 1.0];
    let mut ids_by_key: Vec<HashSet<String>> = vec![HashSet::new(); chart.notes.len()];

    let mut t = 0.0;
    for i in 0..400 {
        game_loop.tick(t, &chart, &mut state).unwrap();
        for active in &state.active_notes {
            for (idx, n) in chart.notes.iter().enumerate() {
                if n.key().matches(&active.key()) {
                    ids_by_key[idx].insert(active.id.clone());
                }
            }
        }
        t += steps[i % steps.len()];
    }

    for (idx, ids) in ids_by_key.iter().enumerate() {
        assert!(ids.len() <= 1, "chart note {idx} spawned as {ids:?}");
    }
    assert_eq!(state.notes.len(), distinct);
}

#[test]
fn scroll_distance_per_quarter_note_ignores_tempo() {
    let slow = song(500.0, vec![note("C4", 0, 0.0)]);
    let fast = song(250.0, vec![note("C4", 0, 0.0)]);

    // One quarter note of travel: q = 1 -> 2.
    let slow_delta = run(&slow, &[10.0], 1000.0)["C4"] - run(&slow, &[10.0], 500.0)["C4"];
    let fast_delta = run(&fast, &[10.0], 500.0)["C4"] - run(&fast, &[10.0], 250.0)["C4"];
    assert!((slow_delta - 300.0).abs() < 1e-6);
    assert!((fast_delta - 300.0).abs() < 1e-6);

    // Same wall-clock span: half the quarter-note duration, twice the distance.
    let slow_wall = run(&slow, &[10.0], 500.0)["C4"] - run(&slow, &[10.0], 250.0)["C4"];
    let fast_wall = fast_delta;
    assert!((slow_wall - 150.0).abs() < 1e-6);
    assert!((fast_wall - 2.0 * slow_wall).abs() < 1e-6);
}

#[test]
fn positions_do_not_depend_on_frame_rate() {
    let chart = song(1000.0, vec![note("C4", 0, 0.0), note("E4", 2, 1.3)]);

    let fixed = run(&chart, &[16.0], 1600.0);
    let variable = run(&chart, &[10.0, 25.0, 40.0, 17.0, 33.0, 12.0, 38.0, 21.0], 1600.0);

    assert_eq!(fixed.len(), 2);
    for (value, y) in &fixed {
        assert!((y - variable[value]).abs() < 1e-6, "{value}: {y} vs {}", variable[value]);
    }
    // 300 px per second at Normal with one-second quarter notes.
    assert!((fixed["C4"] - 430.0).abs() < 1e-6);
    assert!((fixed["E4"] - 40.0).abs() < 1e-6);
}

#[test]
fn expired_note_is_missed_exactly_once() {
    let chart = song(500.0, vec![note("C4", 0, 0.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = playing();
    state.combo = 3;

    let mut missed = 0;
    let mut missed_at = None;
    for k in 0..=300 {
        let t = k as f64 * 10.0;
        let report = game_loop.tick(t, &chart, &mut state).unwrap();
        if report.missed > 0 {
            missed += report.missed;
            missed_at = Some(report.song_time);
        }
    }

    assert_eq!(missed, 1);
    assert_eq!(state.missed_notes_count, 1);
    assert_eq!(state.combo, 0);
    assert_eq!(state.last_hit_zone, Some(LastHit::Missed));
    assert!(state.active_notes.is_empty());
    // y passes 850 at 1.5 s with 600 px/s.
    let at = missed_at.unwrap();
    assert!((1.49..=1.52).contains(&at), "missed at {at}");
}

#[test]
fn pending_removals_are_dropped_without_a_miss() {
    let chart = song(500.0, vec![note("C4", 0, 0.0), note("D4", 1, 0.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = playing();
    game_loop.tick(0.0, &chart, &mut state).unwrap();

    let id = state.active_notes[0].id.clone();
    state.mark_note_for_removal(id.clone());
    let report = game_loop.tick(16.0, &chart, &mut state).unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.missed, 0);
    assert_eq!(state.active_notes.len(), 1);
    assert!(state.active_notes.iter().all(|n| n.id != id));
    assert!(state.pending_note_removals.is_empty());
    assert_eq!(state.missed_notes_count, 0);

    // Still in history, so it never comes back.
    game_loop.tick(32.0, &chart, &mut state).unwrap();
    assert_eq!(state.active_notes.len(), 1);
}

#[test]
fn emptied_active_list_is_restored_from_the_loop_copy() {
    let chart = song(500.0, vec![note("C4", 0, 0.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = playing();
    game_loop.tick(0.0, &chart, &mut state).unwrap();

    state.active_notes.clear();
    game_loop.tick(100.0, &chart, &mut state).unwrap();

    assert_eq!(state.active_notes.len(), 1);
    assert!((state.active_notes[0].y - 10.0).abs() < 1e-9);
    assert_eq!(state.notes.len(), 1);
}

#[test]
fn stalled_frame_is_clamped() {
    let chart = song(500.0, vec![note("C4", 0, 0.0)]);
    let mut game_loop = GameLoop::new(LoopSettings {
        max_frame_delta_s: 0.05,
        ..LoopSettings::default()
    });
    let mut state = playing();
    game_loop.tick(0.0, &chart, &mut state).unwrap();

    let report = game_loop.tick(5000.0, &chart, &mut state).unwrap();
    assert_eq!(report.delta_time, 0.05);
    assert!((report.song_time - 5.0).abs() < 1e-12);
    assert!((state.active_notes[0].y - (-20.0)).abs() < 1e-9);
}

#[test]
fn loop_stops_outside_playing_and_relatches_on_restart() {
    let chart = song(500.0, vec![note("C4", 0, 10.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = GameState::new(LaneMode::Four, Difficulty::Normal);

    assert!(game_loop.tick(0.0, &chart, &mut state).is_none());
    assert!(!game_loop.is_latched());

    state.start_game();
    game_loop.tick(1000.0, &chart, &mut state).unwrap();
    game_loop.tick(3000.0, &chart, &mut state).unwrap();
    assert!((state.current_time - 2.0).abs() < 1e-12);

    state.start_game();
    let report = game_loop.tick(9000.0, &chart, &mut state).unwrap();
    assert_eq!(report.song_time, 0.0);

    state.reset_game();
    assert!(game_loop.tick(9100.0, &chart, &mut state).is_none());
}

#[test]
fn several_misses_in_one_frame_are_counted_together() {
    let chart = song(500.0, vec![note("C4", 0, 0.0), note("D4", 1, 0.0), note("E4", 2, 0.0)]);
    let mut game_loop = GameLoop::new(LoopSettings {
        max_frame_delta_s: 10.0,
        ..LoopSettings::default()
    });
    let mut state = playing();
    game_loop.tick(0.0, &chart, &mut state).unwrap();

    let report = game_loop.tick(2000.0, &chart, &mut state).unwrap();
    assert_eq!(report.missed, 3);
    assert_eq!(state.missed_notes_count, 3);
    assert!(state.active_notes.is_empty());
}

#[test]
fn hard_scrolls_faster_than_easy() {
    let chart = song(500.0, vec![note("C4", 0, 0.0)]);
    let mut positions = Vec::new();
    for speed in [Difficulty::Easy, Difficulty::Hard] {
        let mut game_loop = GameLoop::default();
        let mut state = GameState::new(LaneMode::Four, speed);
        state.start_game();
        game_loop.tick(0.0, &chart, &mut state).unwrap();
        game_loop.tick(50.0, &chart, &mut state).unwrap();
        positions.push(state.active_notes[0].y);
    }
    // 400 px/s vs 800 px/s over 50 ms.
    assert!((positions[0] - (-30.0)).abs() < 1e-9);
    assert!((positions[1] - (-10.0)).abs() < 1e-9);
}

#[test]
fn swapping_the_chart_mid_session_spawns_the_new_notes() {
    let first = song(500.0, vec![note("C4", 0, 0.0)]);
    let second = song(500.0, vec![note("D4", 1, 0.0)]);
    let mut game_loop = GameLoop::default();
    let mut state = playing();

    game_loop.tick(0.0, &first, &mut state).unwrap();
    let report = game_loop.tick(16.0, &second, &mut state).unwrap();

    assert_eq!(report.spawned, 1);
    let values: Vec<&str> = state.active_notes.iter().map(|n| n.note.value.as_str()).collect();
    assert_eq!(values, vec!["C4", "D4"]);
    assert!((report.song_time - 0.016).abs() < 1e-12);

    // Going back does not respawn what is already in history.
    let report = game_loop.tick(32.0, &first, &mut state).unwrap();
    assert_eq!(report.spawned, 0);
    assert_eq!(state.notes.len(), 2);
}
