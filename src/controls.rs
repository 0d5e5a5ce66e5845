//! Player input vocabulary and the two ways of producing it.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    str::FromStr,
    time::Duration,
};

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::{self, BridgeReceiver};
use crate::classifier::Recognizer;
use crate::recognition::RecognitionThread;
use crate::source::{LandmarkSource, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Input {
    Left,
    Right,
    Up,
    Down,
    Play,
    Pause,
    Shop,
    Exit,
    Attack,
    Cast,
    SunStrike,
}

impl Input {
    pub const ALL: [Input; 11] = [
        Input::Left,
        Input::Right,
        Input::Up,
        Input::Down,
        Input::Play,
        Input::Pause,
        Input::Shop,
        Input::Exit,
        Input::Attack,
        Input::Cast,
        Input::SunStrike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Input::Left => "LEFT",
            Input::Right => "RIGHT",
            Input::Up => "UP",
            Input::Down => "DOWN",
            Input::Play => "PLAY",
            Input::Pause => "PAUSE",
            Input::Shop => "SHOP",
            Input::Exit => "EXIT",
            Input::Attack => "ATTACK",
            Input::Cast => "CAST",
            Input::SunStrike => "SUN_STRIKE",
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlsError {
    #[error("unknown input token '{0}'")]
    UnknownInput(String),
}

impl FromStr for Input {
    type Err = ControlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Input::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ControlsError::UnknownInput(token.to_string()))
    }
}

/// Inputs active during one tick.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSet(u16);

impl InputSet {
    pub fn insert(&mut self, input: Input) {
        self.0 |= input.bit();
    }

    pub fn remove(&mut self, input: Input) {
        self.0 &= !input.bit();
    }

    pub fn contains(&self, input: Input) -> bool {
        self.0 & input.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Input> + '_ {
        Input::ALL.into_iter().filter(|i| self.contains(*i))
    }
}

impl FromIterator<Input> for InputSet {
    fn from_iter<T: IntoIterator<Item = Input>>(iter: T) -> Self {
        let mut set = InputSet::default();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl fmt::Debug for InputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Gesture name to input, defaults plus profile overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureBindings {
    map: BTreeMap<String, Input>,
}

impl Default for GestureBindings {
    fn default() -> Self {
        let map = [
            ("left", Input::Left),
            ("right", Input::Right),
            ("up", Input::Up),
            ("down", Input::Down),
            ("play", Input::Play),
            ("pause", Input::Pause),
            ("shop", Input::Shop),
            ("exit", Input::Exit),
            ("pray", Input::SunStrike),
        ]
        .into_iter()
        .map(|(g, i)| (g.to_string(), i))
        .collect();
        Self { map }
    }
}

impl GestureBindings {
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, ControlsError> {
        let mut b = Self::default();
        for (gesture, token) in overrides {
            b.map.insert(gesture.clone(), token.parse()?);
        }
        Ok(b)
    }

    pub fn get(&self, gesture: &str) -> Option<Input> {
        self.map.get(gesture).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Input)> {
        self.map.iter().map(|(g, i)| (g.as_str(), *i))
    }

    pub fn map_names(&self, names: &BTreeSet<String>) -> InputSet {
        names
            .iter()
            .filter_map(|n| {
                let input = self.get(n);
                if input.is_none() {
                    debug!("controls: gesture '{n}' has no binding");
                }
                input
            })
            .collect()
    }
}

pub trait Controls {
    fn name(&self) -> &'static str;

    /// Inputs for the current tick. Never blocks.
    fn poll(&mut self) -> InputSet;

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    D,
    W,
    S,
    MouseLeft,
    MouseRight,
}

/// Held keys map to movement; mouse buttons fire once per press.
#[derive(Debug, Default)]
pub struct KeyboardMouse {
    held: HashSet<Key>,
    clicks: HashSet<Key>,
}

impl KeyboardMouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        if matches!(key, Key::MouseLeft | Key::MouseRight) {
            self.clicks.insert(key);
        } else {
            self.held.insert(key);
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }
}

/// Both or neither pressed cancels out.
fn cancel(a: bool, b: bool) -> (bool, bool) {
    (a && !b, b && !a)
}

impl Controls for KeyboardMouse {
    fn name(&self) -> &'static str {
        "keyboard-mouse"
    }

    fn poll(&mut self) -> InputSet {
        let mut out = InputSet::default();
        let (left, right) = cancel(self.held.contains(&Key::A), self.held.contains(&Key::D));
        let (up, down) = cancel(self.held.contains(&Key::W), self.held.contains(&Key::S));
        let (attack, cast) = cancel(
            self.clicks.contains(&Key::MouseLeft),
            self.clicks.contains(&Key::MouseRight),
        );
        self.clicks.clear();

        for (on, input) in [
            (left, Input::Left),
            (right, Input::Right),
            (up, Input::Up),
            (down, Input::Down),
            (attack, Input::Attack),
            (cast, Input::Cast),
        ] {
            if on {
                out.insert(input);
            }
        }
        out
    }
}

/// Inputs from the recognition thread, one tick behind the camera.
pub struct GestureControls {
    thread: RecognitionThread,
    rx: BridgeReceiver,
    bindings: GestureBindings,
}

impl GestureControls {
    pub fn start(
        source: Box<dyn LandmarkSource>,
        recognizer: Recognizer,
        bindings: GestureBindings,
        capture_timeout: Duration,
    ) -> Result<Self> {
        let (tx, rx) = bridge::channel();
        let thread = RecognitionThread::start(source, recognizer, tx, capture_timeout)?;
        Ok(Self {
            thread,
            rx,
            bindings,
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_running()
    }
}

impl Controls for GestureControls {
    fn name(&self) -> &'static str {
        "gestures"
    }

    fn poll(&mut self) -> InputSet {
        let names = self.rx.drain_gestures();
        self.bindings.map_names(&names)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.thread.stop()
    }
}

/// Gesture controls when the source opened, keyboard/mouse otherwise.
pub fn select_controls(
    source: Result<Box<dyn LandmarkSource>, SourceError>,
    recognizer: Recognizer,
    bindings: GestureBindings,
    capture_timeout: Duration,
) -> Result<Box<dyn Controls>> {
    match source {
        Ok(src) => {
            let c = GestureControls::start(src, recognizer, bindings, capture_timeout)?;
            info!("controls: using hand gestures");
            Ok(Box::new(c))
        }
        Err(e) => {
            warn!("controls: {e}; falling back to keyboard/mouse");
            Ok(Box::new(KeyboardMouse::new()))
        }
    }
}
