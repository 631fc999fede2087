//! Application state shared with the HTTP API

use ds_core::{InputEvent, StateSnapshot};
use tokio::sync::{mpsc, watch};

/// Handles the API uses to observe and steer the control loop
#[derive(Clone)]
pub struct AppState {
    /// Queue of input events drained by the control loop each tick
    pub input_tx: mpsc::Sender<InputEvent>,

    /// Latest snapshot published by the control loop (`None` before the
    /// first tick)
    pub snapshot_rx: watch::Receiver<Option<StateSnapshot>>,
}

/// The control loop's ends of the channels
pub struct LoopEndpoints {
    pub events: mpsc::Receiver<InputEvent>,
    pub snapshots: watch::Sender<Option<StateSnapshot>>,
}

impl AppState {
    pub fn new(input_queue: usize) -> (Self, LoopEndpoints) {
        let (input_tx, events) = mpsc::channel(input_queue.max(1));
        let (snapshots, snapshot_rx) = watch::channel(None);

        (
            Self {
                input_tx,
                snapshot_rx,
            },
            LoopEndpoints { events, snapshots },
        )
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<StateSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<Option<StateSnapshot>> {
        self.snapshot_rx.clone()
    }
}
