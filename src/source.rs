//! Landmark sources: whatever turns camera frames into hand landmark sets.
//!
//! The tracker itself lives outside this crate; recordings in JSON Lines stand in for it.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::LandmarkSet;

/// The tracker never reports more hands than this.
pub const MAX_HANDS: usize = 2;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("capture device disconnected: {0}")]
    Disconnected(String),

    #[error("bad frame at {location}: {reason}")]
    BadFrame { location: String, reason: String },

    #[error("end of recording")]
    Exhausted,
}

pub trait LandmarkSource: Send {
    /// Waits at most `timeout` for the next frame. `Ok(None)` means nothing arrived in time.
    fn capture(&mut self, timeout: Duration) -> Result<Option<Vec<LandmarkSet>>, SourceError>;
}

/// One line of a recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub hands: Vec<LandmarkSet>,
}

/// Plays back a JSON Lines recording at a fixed frame interval.
pub struct ReplaySource {
    path: PathBuf,
    lines: std::io::Lines<BufReader<File>>,
    line_no: usize,
    interval: Duration,
    next_due: Instant,
}

impl ReplaySource {
    pub fn open(path: &Path, interval: Duration) -> Result<Self, SourceError> {
        let file = File::open(path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
        debug!("replay: opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
            interval,
            next_due: Instant::now(),
        })
    }

    fn next_frame(&mut self) -> Result<Vec<LandmarkSet>, SourceError> {
        loop {
            let line = match self.lines.next() {
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    return Err(SourceError::Disconnected(format!(
                        "{}: {e}",
                        self.path.display()
                    )));
                }
                None => return Err(SourceError::Exhausted),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let frame: RecordedFrame =
                serde_json::from_str(&line).map_err(|e| SourceError::BadFrame {
                    location: format!("{}:{}", self.path.display(), self.line_no),
                    reason: e.to_string(),
                })?;
            let mut hands = frame.hands;
            if hands.len() > MAX_HANDS {
                warn!(
                    "replay: {}:{} has {} hands, keeping the first {MAX_HANDS}",
                    self.path.display(),
                    self.line_no,
                    hands.len()
                );
                hands.truncate(MAX_HANDS);
            }
            return Ok(hands);
        }
    }
}

impl LandmarkSource for ReplaySource {
    fn capture(&mut self, timeout: Duration) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        let now = Instant::now();
        if self.next_due > now + timeout {
            thread::sleep(timeout);
            return Ok(None);
        }
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        }
        self.next_due = Instant::now() + self.interval;
        self.next_frame().map(Some)
    }
}

/// In-memory frames handed out in order, then silence.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<LandmarkSet>>,
    disconnect_when_done: bool,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Vec<LandmarkSet>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            disconnect_when_done: false,
        }
    }

    /// Report a disconnect instead of idling once the frames run out.
    pub fn disconnect_when_done(mut self) -> Self {
        self.disconnect_when_done = true;
        self
    }
}

impl LandmarkSource for ScriptedSource {
    fn capture(&mut self, timeout: Duration) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        match self.frames.pop_front() {
            Some(f) => Ok(Some(f)),
            None if self.disconnect_when_done => {
                Err(SourceError::Disconnected("script finished".into()))
            }
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Reads a whole recording up front, for offline tools.
pub fn read_recording(path: &Path) -> Result<Vec<Vec<LandmarkSet>>, SourceError> {
    let mut src = ReplaySource::open(path, Duration::ZERO)?;
    let mut frames = Vec::new();
    loop {
        match src.next_frame() {
            Ok(f) => frames.push(f),
            Err(SourceError::Exhausted) => return Ok(frames),
            Err(e) => return Err(e),
        }
    }
}
