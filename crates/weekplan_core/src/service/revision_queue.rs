//! Serialized request queue in front of one revision controller.
//!
//! # Responsibility
//! - Accept change requests from many callers and apply them in arrival order.
//! - Let callers abandon a queued request before it is validated.
//!
//! # Invariants
//! - Exactly one worker thread owns the controller; no shared mutable state.
//! - Cancellation after validation started has no effect.
//! - Dropping the queue drains pending requests and joins the worker.

use crate::model::calendar::Calendar;
use crate::model::request::ChangeRequest;
use crate::service::outcome::{ResolutionOutcome, RevisionError};
use crate::service::revision_controller::RevisionController;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "weekplan-revision";

/// Queue transport failure.
#[derive(Debug)]
pub enum QueueError {
    Spawn(std::io::Error),
    /// Worker is gone; the request was not applied.
    Disconnected,
    WorkerPanicked,
    Load(RevisionError),
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn revision worker: {err}"),
            Self::Disconnected => write!(f, "revision worker disconnected"),
            Self::WorkerPanicked => write!(f, "revision worker panicked"),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Load(err) => Some(err),
            _ => None,
        }
    }
}

enum Command {
    Submit {
        request: ChangeRequest,
        cancelled: Arc<AtomicBool>,
        reply: Sender<ResolutionOutcome>,
    },
    Snapshot {
        reply: Sender<Calendar>,
    },
    Load {
        calendar: Calendar,
        reply: Sender<Result<(), RevisionError>>,
    },
}

/// Ticket for a queued request.
pub struct PendingRevision {
    cancelled: Arc<AtomicBool>,
    reply: Receiver<ResolutionOutcome>,
}

impl PendingRevision {
    /// Asks the worker to skip this request if it has not been validated yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Blocks until the worker has processed the request.
    pub fn wait(self) -> Result<ResolutionOutcome, QueueError> {
        self.reply.recv().map_err(|_| QueueError::Disconnected)
    }
}

/// FIFO front end owning a controller on a dedicated thread.
pub struct RevisionQueue {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<RevisionController>>,
}

impl RevisionQueue {
    /// Moves `controller` onto a worker thread.
    pub fn spawn(controller: RevisionController) -> Result<Self, QueueError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(controller, receiver))
            .map_err(QueueError::Spawn)?;
        info!("event=queue_start module=queue status=ok");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Enqueues a request; results arrive in submission order.
    pub fn submit(&self, request: ChangeRequest) -> Result<PendingRevision, QueueError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (reply, receiver) = mpsc::channel();
        self.send(Command::Submit {
            request,
            cancelled: Arc::clone(&cancelled),
            reply,
        })?;
        Ok(PendingRevision {
            cancelled,
            reply: receiver,
        })
    }

    /// Snapshot taken after every previously queued request.
    pub fn snapshot(&self) -> Result<Calendar, QueueError> {
        let (reply, receiver) = mpsc::channel();
        self.send(Command::Snapshot { reply })?;
        receiver.recv().map_err(|_| QueueError::Disconnected)
    }

    /// Loads a snapshot after every previously queued request.
    pub fn load(&self, calendar: Calendar) -> Result<(), QueueError> {
        let (reply, receiver) = mpsc::channel();
        self.send(Command::Load { calendar, reply })?;
        receiver
            .recv()
            .map_err(|_| QueueError::Disconnected)?
            .map_err(QueueError::Load)
    }

    /// Drains the queue and hands the controller back.
    pub fn shutdown(mut self) -> Result<RevisionController, QueueError> {
        self.join()?.ok_or(QueueError::Disconnected)
    }

    fn send(&self, command: Command) -> Result<(), QueueError> {
        self.sender
            .as_ref()
            .ok_or(QueueError::Disconnected)?
            .send(command)
            .map_err(|_| QueueError::Disconnected)
    }

    fn join(&mut self) -> Result<Option<RevisionController>, QueueError> {
        drop(self.sender.take());
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map(Some)
                .map_err(|_| QueueError::WorkerPanicked),
            None => Ok(None),
        }
    }
}

impl Drop for RevisionQueue {
    fn drop(&mut self) {
        if let Err(err) = self.join() {
            error!("event=queue_stop module=queue status=error error={err}");
        }
    }
}

fn run_worker(mut controller: RevisionController, receiver: Receiver<Command>) -> RevisionController {
    for command in receiver {
        match command {
            Command::Submit {
                request,
                cancelled,
                reply,
            } => {
                let outcome =
                    controller.submit_unless(request, || cancelled.load(Ordering::SeqCst));
                let _ = reply.send(outcome);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(controller.snapshot());
            }
            Command::Load { calendar, reply } => {
                let _ = reply.send(controller.load(calendar));
            }
        }
    }
    info!("event=queue_stop module=queue status=ok");
    controller
}
