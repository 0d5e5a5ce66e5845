//! The one channel between the recognition thread and the game loop.
//!
//! Unbounded and lossless: if the game loop stalls, batches pile up until the next drain.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, SendError, Sender, TryRecvError};

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Everything recognized in one recognition iteration.
    GestureBatch { gestures: BTreeSet<String> },
}

pub fn channel() -> (BridgeSender, BridgeReceiver) {
    let (tx, rx) = mpsc::channel();
    (BridgeSender { tx }, BridgeReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct BridgeSender {
    tx: Sender<BridgeEvent>,
}

impl BridgeSender {
    pub fn send_batch(&self, gestures: BTreeSet<String>) -> Result<(), SendError<BridgeEvent>> {
        self.tx.send(BridgeEvent::GestureBatch { gestures })
    }
}

#[derive(Debug)]
pub struct BridgeReceiver {
    rx: Receiver<BridgeEvent>,
}

impl BridgeReceiver {
    /// Everything posted since the last drain, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<BridgeEvent> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(evt) => out.push(evt),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if out.len() > 1 {
            debug!("bridge: drained {} pending gesture batches", out.len());
        }
        out
    }

    /// Union of every batch currently queued.
    pub fn drain_gestures(&self) -> BTreeSet<String> {
        self.drain()
            .into_iter()
            .flat_map(|BridgeEvent::GestureBatch { gestures }| gestures)
            .collect()
    }
}
