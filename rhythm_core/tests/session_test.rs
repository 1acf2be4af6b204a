use rhythm_core::audio::cue::ChannelCueSink;
use rhythm_core::chart::{Note, Song};
use rhythm_core::config::GameConfig;
use rhythm_core::gameplay::{GameSession, HitZone, LastHit, Phase, SessionError};
use rhythm_core::input::events::InputEvent;

fn one_note_song() -> Song {
    Song {
        name: "one".to_string(),
        quarter_note_duration: 500.0,
        notes: vec![Note {
            value: "D4".to_string(),
            position: 1,
            instrument: 0,
            time: 0.0,
        }],
    }
}

#[test]
fn perfect_hit_end_to_end() {
    let config = GameConfig::default();
    assert_eq!(config.zones.target_y(), 700.0);
    assert_eq!(config.zones.bands()[2], (HitZone::Perfect, 690.0, 710.0));

    let (cue_sink, cues) = ChannelCueSink::new();
    let mut session = GameSession::with_cue_sink(&config, Box::new(cue_sink));
    session.load_song(one_note_song());
    session.start_game().unwrap();

    let report = session.frame(0.0).unwrap();
    assert_eq!(report.spawned, 1);
    assert_eq!(session.state.active_notes[0].y, -50.0);

    // Advance in 16 ms frames until the note reaches the perfect band.
    let mut t = 0.0;
    while session.state.active_notes[0].y < 690.0 {
        t += 16.0;
        session.frame(t).unwrap();
        assert!(t < 2000.0, "note never reached the target");
    }
    let y = session.state.active_notes[0].y;
    assert!((690.0..710.0).contains(&y), "y = {y}");

    // 'F' is lane 1 in the four-lane map.
    let hit = session.handle_input(InputEvent::press('F', t)).unwrap();
    assert_eq!(hit.zone, HitZone::Perfect);
    assert_eq!(session.state.score, 300);
    assert_eq!(session.state.combo, 1);
    assert_eq!(session.state.last_hit_zone, Some(LastHit::Hit(HitZone::Perfect)));
    assert!(session.state.key_states[1]);
    assert_eq!(session.state.active_notes.len(), 1);

    let report = session.frame(t + 16.0).unwrap();
    assert_eq!(report.removed, 1);
    assert!(session.state.active_notes.is_empty());
    assert_eq!(session.state.missed_notes_count, 0);

    let cue = cues.try_recv().unwrap();
    assert_eq!(cue.lane, 1);
    assert!((cue.frequency_hz - 293.664_767_9).abs() < 1e-6);

    session.handle_input(InputEvent::release('f', t + 20.0));
    assert!(!session.state.key_states[1]);

    // Nothing left to miss.
    session.frame(t + 3000.0).unwrap();
    assert_eq!(session.state.missed_notes_count, 0);
    assert_eq!(session.state.score, 300);
}

#[test]
fn start_requires_a_song() {
    let mut session = GameSession::new(&GameConfig::default());
    assert_eq!(session.start_game(), Err(SessionError::NoSong));
    assert!(session.frame(0.0).is_none());
}

#[test]
fn unmapped_keys_are_ignored() {
    let mut session = GameSession::new(&GameConfig::default());
    session.load_song(one_note_song());
    session.start_game().unwrap();
    session.frame(0.0).unwrap();

    assert!(session.handle_input(InputEvent::press('Q', 0.0)).is_none());
    assert!(session.state.key_states.iter().all(|k| !k));
}

#[test]
fn loading_a_song_returns_to_the_menu() {
    let mut session = GameSession::new(&GameConfig::default());
    session.load_song(one_note_song());
    session.start_game().unwrap();
    session.frame(0.0).unwrap();
    assert_eq!(session.state.phase, Phase::Playing);

    session.load_song(one_note_song());
    assert_eq!(session.state.phase, Phase::Menu);
    assert!(session.state.active_notes.is_empty());
    assert!(session.frame(100.0).is_none());
}

#[test]
fn snapshot_mirrors_state() {
    let mut session = GameSession::new(&GameConfig::default());
    session.load_song(one_note_song());
    session.start_game().unwrap();
    session.frame(0.0).unwrap();
    session.frame(500.0).unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.active_notes, session.state.active_notes);
    assert_eq!(snapshot.key_states.len(), 4);
    assert!((snapshot.current_time - 0.5).abs() < 1e-12);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json.get("activeNotes").is_some());
    assert_eq!(json["activeNotes"][0]["value"], "D4");
}
