use std::cell::RefCell;
use std::rc::Rc;

use beatline::edit::TimelineController;
use beatline::model::chart::Chart;
use beatline::model::tempo::{TempoBreakpoint, TempoMap};
use beatline::model::visibility::{VisibilityInterval, VisibilityMask, VisibilityMode};
use beatline::play::judge::JudgeTier;
use beatline::play::session::PlaySession;
use beatline::play::transport::MediaTransport;

#[test]
fn constant_tempo_beat_to_time() {
    let map = TempoMap::new(120.0).unwrap();
    let ms = map.beat_index_to_time_ms(4.0);
    assert!((ms - 2000.0).abs() < 0.001, "beat 4 at 120 bpm should be 2000ms");
}

#[test]
fn tempo_breakpoint_splits_the_walk() {
    let map = TempoMap::with_breakpoints(
        120.0,
        [TempoBreakpoint {
            beat_index: 8,
            bpm: 240.0,
        }],
    )
    .unwrap();

    let ms = map.beat_index_to_time_ms(8.0);
    assert!((ms - 4000.0).abs() < 0.001, "beats before the change run at 120 bpm");
    let ms = map.beat_index_to_time_ms(12.0);
    assert!((ms - 5000.0).abs() < 0.001, "beats after the change run at 240 bpm");
}

#[test]
fn hidden_interval_fade_profile() {
    let mask = VisibilityMask::from_intervals([VisibilityInterval {
        id: 0,
        start_time_ms: 1000.0,
        end_time_ms: 3000.0,
        mode: VisibilityMode::Hidden,
        fade_in_ms: 500.0,
        fade_out_ms: 500.0,
    }]);

    for (time_ms, expected) in [
        (1000.0, 0.0),
        (1250.0, 0.5),
        (2000.0, 1.0),
        (2750.0, 0.5),
        (3000.0, 0.0),
    ] {
        let opacity = mask.opacity_at(time_ms);
        assert!(
            (opacity - expected).abs() < 1e-9,
            "opacity at {time_ms}ms should be {expected}, got {opacity}"
        );
    }
}

#[test]
fn input_on_the_perfect_boundary() {
    // 40ms is the inclusive edge of the Perfect window.
    let mut session = PlaySession::new([beatline::model::note::Note::new(0, 1, 1000.0, 0.0)]);
    assert_eq!(session.key_press(1, 1040.0), Some(JudgeTier::Perfect));
    assert_eq!(session.score().total_score, 100);
}

#[derive(Debug, Default)]
struct TransportLog {
    position_seconds: f64,
    seeks: Vec<f64>,
    plays: u32,
}

struct FakeTransport(Rc<RefCell<TransportLog>>);

impl MediaTransport for FakeTransport {
    fn position_seconds(&mut self) -> anyhow::Result<f64> {
        Ok(self.0.borrow().position_seconds)
    }

    fn seek_to(&mut self, seconds: f64) -> anyhow::Result<()> {
        self.0.borrow_mut().seeks.push(seconds);
        self.0.borrow_mut().position_seconds = seconds;
        Ok(())
    }

    fn play(&mut self) -> anyhow::Result<()> {
        self.0.borrow_mut().plays += 1;
        Ok(())
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn set_playback_rate(&mut self, _rate: f64) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn scrub_while_playing_issues_one_seek_and_resumes() {
    let log = Rc::new(RefCell::new(TransportLog::default()));
    let mut c = TimelineController::new(120.0, 1.0, 800.0).unwrap();
    c.bind_transport(Box::new(FakeTransport(Rc::clone(&log))));
    log.borrow_mut().position_seconds = 5.0;

    c.play();
    for _ in 0..3 {
        c.tick(16.0);
    }
    assert!((c.current_time_ms() - 5000.0).abs() < 0.001);
    assert!(log.borrow().seeks.is_empty());

    // Drag the playhead from 5000ms up to 9000ms: 800px above time zero,
    // minus 9000ms * 0.2px/ms.
    c.begin_scrub(c.time_to_y(5000.0));
    c.update_scrub(c.time_to_y(7000.0));
    c.update_scrub(c.time_to_y(9000.0));
    assert!(log.borrow().seeks.is_empty(), "no seeks while dragging");

    c.end_scrub();
    assert_eq!(log.borrow().seeks, vec![9.0], "exactly one seek, at the release point");
    assert!(c.is_playing(), "playback resumes after the drag");
    assert!((c.current_time_ms() - 9000.0).abs() < 0.001);
}

#[test]
fn chart_drives_a_full_play_through() {
    let chart = Chart::from_json(
        r#"{
            "bpm": 120.0,
            "notes": [
                {"id": 0, "lane": 0, "timeMs": 1000.0, "durationMs": 0.0, "kind": "tap"},
                {"id": 1, "lane": 1, "timeMs": 2000.0, "durationMs": 500.0, "kind": "hold"},
                {"id": 2, "lane": 2, "timeMs": 3000.0, "durationMs": 0.0, "kind": "tap"}
            ]
        }"#,
    )
    .unwrap();

    let mut session = PlaySession::new(chart.notes.iter().copied());
    session.update(0.0);

    assert_eq!(session.key_press(0, 1005.0), Some(JudgeTier::Perfect));
    assert_eq!(session.key_press(1, 2010.0), None); // hold engages
    assert_eq!(session.key_release(1, 2500.0), Some(JudgeTier::Perfect));
    // Ignore the last note; the sweep misses it.
    session.update(4000.0);

    let score = session.score();
    assert_eq!(score.perfect, 2);
    assert_eq!(score.miss, 1);
    assert_eq!(score.max_combo, 2);
    assert_eq!(score.combo, 0);
    assert!(session.is_complete());
}

#[test]
fn editor_facade_keeps_snap_and_clock_consistent() {
    let mut c = TimelineController::new(120.0, 1.0, 800.0).unwrap();
    c.set_grid_division(4);

    let id = c.add_note(0, 1003.0, 0.0);
    let note = c.notes().iter().find(|n| n.id == id).unwrap();
    assert_eq!(note.time_ms, 1000.0);

    c.seek(note.time_ms);
    assert!((c.current_beat_index() - 2.0).abs() < 1e-9);
    assert_eq!(c.time_to_y(c.current_time_ms()), 600.0);
}
