use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::OptionsFetcher;
use crate::selection::{ApplyResult, FetchOutcome, FetchRequest, Node, SelectionController};

/// Runs each request on its own worker so slow keys never block newer ones.
pub fn spawn_provider<F>(fetcher: Arc<F>, tx: Sender<FetchOutcome>, cmd_rx: Receiver<FetchRequest>)
where
    F: OptionsFetcher + ?Sized + 'static,
{
    thread::spawn(move || {
        for req in cmd_rx {
            let tx = tx.clone();
            let fetcher = fetcher.clone();
            thread::spawn(move || {
                let result = fetcher.fetch(&req.params).map_err(|err| format!("{err:#}"));
                let _ = tx.send(FetchOutcome {
                    node: req.node,
                    key: req.key,
                    generation: req.generation,
                    result,
                });
            });
        }
    });
}

/// Owner-side ends of the provider channels.
pub struct Feed {
    cmd_tx: Sender<FetchRequest>,
    rx: Receiver<FetchOutcome>,
}

impl Feed {
    pub fn start<F>(fetcher: Arc<F>) -> Self
    where
        F: OptionsFetcher + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        spawn_provider(fetcher, tx, cmd_rx);
        Self { cmd_tx, rx }
    }

    /// Forwards whatever the controller has queued.
    pub fn dispatch(&self, controller: &mut SelectionController) {
        for req in controller.take_requests() {
            if self.cmd_tx.send(req).is_err() {
                controller.push_log("[WARN] Provider is gone; fetch request dropped");
            }
        }
    }

    /// Applies outcomes that already arrived, without waiting.
    pub fn drain(&self, controller: &mut SelectionController) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            if controller.apply_outcome(outcome) != ApplyResult::Superseded {
                applied += 1;
            }
            self.dispatch(controller);
        }
        applied
    }

    /// Waits until no node is loading or `timeout` passes.
    pub fn settle(&self, controller: &mut SelectionController, timeout: Duration) {
        self.dispatch(controller);
        let deadline = Instant::now() + timeout;
        while Node::ALL.iter().any(|n| controller.is_loading(*n)) {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                controller.push_log("[WARN] Timed out waiting for options");
                return;
            }
            match self.rx.recv_timeout(left) {
                Ok(outcome) => {
                    controller.apply_outcome(outcome);
                    self.dispatch(controller);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        self.drain(controller);
    }
}
