mod common;

use std::{
    collections::BTreeSet,
    io::Write,
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use common::Hand;
use flowheroes::bridge::{self, BridgeEvent};
use flowheroes::classifier::{Classifier, Recognizer};
use flowheroes::controls::{GestureBindings, Input, select_controls};
use flowheroes::gestures::{Registry, Tuning};
use flowheroes::landmarks::{Finger, LandmarkSet};
use flowheroes::recognition::RecognitionThread;
use flowheroes::source::{
    LandmarkSource, RecordedFrame, ReplaySource, ScriptedSource, SourceError,
};

/// Shows the same hands every millisecond, like a camera pointed at a still pose.
struct StillCamera(Vec<LandmarkSet>);

impl LandmarkSource for StillCamera {
    fn capture(&mut self, timeout: Duration) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        thread::sleep(timeout.min(Duration::from_millis(1)));
        Ok(Some(self.0.clone()))
    }
}

fn stage(registry: Registry, threshold: f32) -> Classifier {
    Classifier::new(Arc::new(registry), threshold, Tuning::default())
}

fn movement_and_spells() -> Recognizer {
    Recognizer::new()
        .with("movement", stage(Registry::movement(), 0.8))
        .with("spells", stage(Registry::spells(), 0.8))
}

fn write_recording(frames: &[RecordedFrame]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    for frame in frames {
        writeln!(f, "{}", serde_json::to_string(frame).unwrap()).unwrap();
    }
    f
}

#[test]
fn bridge_preserves_batch_order() {
    let (tx, rx) = bridge::channel();
    let sent: Vec<BTreeSet<String>> = (0..50)
        .map(|i| BTreeSet::from([format!("g{i}")]))
        .collect();
    let producer = {
        let sent = sent.clone();
        thread::spawn(move || {
            for batch in sent {
                tx.send_batch(batch).unwrap();
            }
        })
    };
    producer.join().unwrap();

    let got: Vec<_> = rx
        .drain()
        .into_iter()
        .map(|BridgeEvent::GestureBatch { gestures }| gestures)
        .collect();
    assert_eq!(got, sent);
}

#[test]
fn replayed_recording_reaches_the_game_as_inputs() {
    let left = Hand::open(0.5, 0.8).point(Finger::Index, (-1.0, 0.0)).build();
    let frames = [
        RecordedFrame { hands: vec![] },
        RecordedFrame { hands: vec![left] },
    ];
    let rec = write_recording(&frames);

    let source = ReplaySource::open(rec.path(), Duration::from_millis(1))
        .map(|s| Box::new(s) as Box<dyn LandmarkSource>);
    let mut controls = select_controls(
        source,
        movement_and_spells(),
        GestureBindings::default(),
        Duration::from_millis(5),
    )
    .unwrap();
    assert_eq!(controls.name(), "gestures");

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while seen.is_empty() && Instant::now() < deadline {
        seen.extend(controls.poll().iter());
        thread::sleep(Duration::from_millis(2));
    }
    controls.shutdown().unwrap();
    assert_eq!(seen, vec![Input::Left]);
}

#[test]
fn missing_recording_falls_back_to_keyboard() {
    let source = ReplaySource::open(Path::new("/definitely/not/here.jsonl"), Duration::ZERO)
        .map(|s| Box::new(s) as Box<dyn LandmarkSource>);
    let mut controls = select_controls(
        source,
        movement_and_spells(),
        GestureBindings::default(),
        Duration::from_millis(5),
    )
    .unwrap();
    assert_eq!(controls.name(), "keyboard-mouse");
    assert!(controls.poll().is_empty());
}

#[test]
fn two_hand_pray_publishes_one_batch() {
    let pray = vec![
        Hand::open(0.47, 0.8).build(),
        Hand::open(0.47, 0.8).shift(0.02, 0.0).build(),
    ];
    let spells = Recognizer::new().with("spells", stage(Registry::spells(), 0.6));
    let (tx, rx) = bridge::channel();
    let mut t = RecognitionThread::start(
        Box::new(ScriptedSource::new([pray])),
        spells,
        tx,
        Duration::from_millis(2),
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut got = BTreeSet::new();
    while got.is_empty() && Instant::now() < deadline {
        got = rx.drain_gestures();
        thread::sleep(Duration::from_millis(1));
    }
    t.stop().unwrap();
    assert_eq!(got, BTreeSet::from(["pray".to_string()]));
}

#[test]
fn stop_is_bounded_by_the_capture_timeout() {
    let (tx, _rx) = bridge::channel();
    let mut t = RecognitionThread::start(
        Box::new(ScriptedSource::default()),
        movement_and_spells(),
        tx,
        Duration::from_millis(20),
    )
    .unwrap();
    thread::sleep(Duration::from_millis(30));

    let started = Instant::now();
    t.stop().unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!t.is_running());
}

#[test]
fn recognizer_swap_takes_effect_while_running() {
    let up = Hand::open(0.5, 0.8).build();
    let (tx, rx) = bridge::channel();
    let spells_only = Recognizer::new().with("spells", stage(Registry::spells(), 0.8));
    let mut t = RecognitionThread::start(
        Box::new(StillCamera(vec![up])),
        spells_only,
        tx,
        Duration::from_millis(5),
    )
    .unwrap();

    thread::sleep(Duration::from_millis(20));
    assert!(rx.drain().is_empty(), "pray needs two hands");

    t.update_recognizer(movement_and_spells());
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut got = BTreeSet::new();
    while got.is_empty() && Instant::now() < deadline {
        got = rx.drain_gestures();
        thread::sleep(Duration::from_millis(1));
    }
    t.stop().unwrap();
    assert_eq!(got, BTreeSet::from(["up".to_string()]));
}
