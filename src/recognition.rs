//! Background recognition loop: capture, classify, publish.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Result, anyhow};
use log::{debug, error, info, warn};

use crate::bridge::BridgeSender;
use crate::classifier::Recognizer;
use crate::source::{LandmarkSource, SourceError};

/// Handle to the running recognition thread.
pub struct RecognitionThread {
    recognizer: Arc<Mutex<Recognizer>>,
    cancel: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RecognitionThread {
    pub fn start(
        source: Box<dyn LandmarkSource>,
        recognizer: Recognizer,
        tx: BridgeSender,
        capture_timeout: Duration,
    ) -> Result<Self> {
        let recognizer = Arc::new(Mutex::new(recognizer));
        let cancel = Arc::new(AtomicBool::new(false));

        let rec = recognizer.clone();
        let flag = cancel.clone();
        let handle = thread::Builder::new()
            .name("recognition".into())
            .spawn(move || run_loop(source, rec, tx, flag, capture_timeout))?;
        info!("recognition: thread started");

        Ok(Self {
            recognizer,
            cancel,
            handle: Some(handle),
        })
    }

    /// Swap registries, threshold or tuning without restarting capture.
    pub fn update_recognizer(&self, recognizer: Recognizer) {
        match self.recognizer.lock() {
            Ok(mut r) => *r = recognizer,
            Err(_) => error!("recognition: recognizer lock poisoned, update dropped"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Raises the cancellation flag and waits for the current capture to time out.
    pub fn stop(&mut self) -> Result<()> {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(h) = self.handle.take() {
            h.join()
                .map_err(|_| anyhow!("recognition thread panicked"))?;
            info!("recognition: thread stopped");
        }
        Ok(())
    }
}

impl Drop for RecognitionThread {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("{e}");
        }
    }
}

fn run_loop(
    mut source: Box<dyn LandmarkSource>,
    recognizer: Arc<Mutex<Recognizer>>,
    tx: BridgeSender,
    cancel: Arc<AtomicBool>,
    capture_timeout: Duration,
) {
    while !cancel.load(Ordering::SeqCst) {
        let hands = match source.capture(capture_timeout) {
            Ok(Some(hands)) => hands,
            Ok(None) => continue,
            Err(SourceError::BadFrame { location, reason }) => {
                warn!("recognition: skipping bad frame at {location}: {reason}");
                continue;
            }
            Err(SourceError::Exhausted) => {
                info!("recognition: source exhausted");
                break;
            }
            Err(e) => {
                error!("recognition: {e}");
                break;
            }
        };

        let labels = match recognizer.lock() {
            Ok(r) => r.classify(&hands),
            Err(_) => {
                error!("recognition: recognizer lock poisoned");
                break;
            }
        };
        if labels.is_empty() {
            continue;
        }
        debug!("recognition: {} hand(s) -> {:?}", hands.len(), labels);
        if tx.send_batch(labels).is_err() {
            info!("recognition: game loop gone, stopping");
            break;
        }
    }
}
