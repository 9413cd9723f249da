//! Background side of the protocol: a dedicated thread running one piece of
//! work at a time.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use super::protocol::{MainMessage, WorkerMessage};
use crate::error::FirstErrorCapture;
use crate::pipeline::{Pipeline, Reporter};

/// Reporter sending progress over the executor's channel.
struct ChannelReporter<'a> {
    tx: &'a Sender<WorkerMessage>,
}

impl Reporter for ChannelReporter<'_> {
    fn status(&self, msg: &str) {
        // A closed channel is noticed when the terminal message is sent.
        let _ = self.tx.send(WorkerMessage::Status {
            status: msg.to_string(),
        });
    }

    fn log(&self, msg: &str) {
        let _ = self.tx.send(WorkerMessage::Log {
            log: msg.to_string(),
        });
    }
}

/// Receive work until the initiator hangs up.
pub(super) fn executor_loop(
    pipeline: Pipeline,
    rx: Receiver<MainMessage>,
    tx: Sender<WorkerMessage>,
    undelivered: Arc<FirstErrorCapture>,
) {
    while let Ok(message) = rx.recv() {
        match message {
            MainMessage::SendWork(work) => {
                log::debug!("Executor received work: {:?}", work);
                let reporter = ChannelReporter { tx: &tx };
                let terminal = match pipeline.run(&work, &reporter) {
                    Ok(summary) => {
                        log::info!(
                            "Run finished: {} rows read, {} matched, {} exported",
                            summary.rows_read,
                            summary.matched,
                            summary.kept
                        );
                        WorkerMessage::WorkDone
                    }
                    Err(e) => {
                        log::error!("Run failed: {}", e);
                        WorkerMessage::Error {
                            error: e.to_string(),
                        }
                    }
                };
                if let Err(unsent) = tx.send(terminal) {
                    if let WorkerMessage::Error { error } = unsent.0 {
                        undelivered.store_msg(error);
                    }
                    log::warn!("Initiator gone, executor stopping");
                    return;
                }
            }
        }
    }
    log::debug!("Executor channel closed");
}
