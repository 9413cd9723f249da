//! Offloading a run to a background executor.
//!
//! The initiator owns a [`WorkerHandle`]. It sends exactly one
//! [`MainMessage::SendWork`] per run and then drains [`WorkerMessage`]s until
//! the terminal `WorkDone` or `Error`. Sending new work while a run is in
//! flight is refused.

mod executor;
mod protocol;

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{FirstErrorCapture, PuzzleError, Result};
use crate::pipeline::Pipeline;

pub use protocol::{MainMessage, SendWork, WorkerMessage};

pub struct WorkerHandle {
    tx: Option<Sender<MainMessage>>,
    rx: Receiver<WorkerMessage>,
    running: bool,
    undelivered: Arc<FirstErrorCapture>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Start the executor thread around `pipeline`.
    pub fn spawn(pipeline: Pipeline) -> Result<Self> {
        let (main_tx, main_rx) = channel();
        let (worker_tx, worker_rx) = channel();
        let undelivered = Arc::new(FirstErrorCapture::new());

        let capture = Arc::clone(&undelivered);
        let thread = std::thread::Builder::new()
            .name("puzzle-executor".to_string())
            .spawn(move || executor::executor_loop(pipeline, main_rx, worker_tx, capture))
            .map_err(|e| PuzzleError::Worker(format!("failed to spawn executor: {}", e)))?;

        Ok(Self {
            tx: Some(main_tx),
            rx: worker_rx,
            running: false,
            undelivered,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn send_work(&mut self, work: SendWork) -> Result<()> {
        if self.running {
            return Err(PuzzleError::state(
                "work already in progress, wait for it to finish",
            ));
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| PuzzleError::state("executor already shut down"))?;
        tx.send(MainMessage::SendWork(work))
            .map_err(|_| PuzzleError::Worker("executor is not running".to_string()))?;
        self.running = true;
        Ok(())
    }

    /// Block for the next executor message; `None` once the executor is gone.
    pub fn next_message(&mut self) -> Option<WorkerMessage> {
        match self.rx.recv() {
            Ok(message) => {
                if message.is_terminal() {
                    self.running = false;
                }
                Some(message)
            }
            Err(_) => {
                self.running = false;
                None
            }
        }
    }

    /// Send `work` and drain messages until the terminal one.
    ///
    /// `on_status` receives progress text, `on_log` diagnostic text.
    pub fn run(
        &mut self,
        work: SendWork,
        mut on_status: impl FnMut(&str),
        mut on_log: impl FnMut(&str),
    ) -> Result<()> {
        self.send_work(work)?;
        loop {
            match self.next_message() {
                Some(WorkerMessage::Status { status }) => on_status(&status),
                Some(WorkerMessage::Log { log }) => on_log(&log),
                Some(WorkerMessage::WorkDone) => return Ok(()),
                Some(WorkerMessage::Error { error }) => return Err(PuzzleError::Worker(error)),
                None => {
                    return Err(self.undelivered.get().unwrap_or_else(|| {
                        PuzzleError::Worker("executor exited without a result".to_string())
                    }))
                }
            }
        }
    }

    /// Close the work channel and join the executor thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PuzzleError::Worker("executor thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("{}", e);
        }
    }
}
