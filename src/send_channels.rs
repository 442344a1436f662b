use std::thread::JoinHandle;
use crossbeam_channel::{Receiver, Sender};
use crate::alpr::Alpr;
use crate::common::{AlprError, AlprImage, PlateResult};

/// Worker side of the channel pair.
#[derive(Debug)]
pub struct AlprState {
    pub frame_rx: Receiver<Box<AlprImage>>,
    pub result_tx: Sender<Box<crate::Result<Vec<PlateResult>>>>,
}

/// Caller side of the channel pair.
#[derive(Debug)]
pub struct SendState {
    pub frame_tx: Sender<Box<AlprImage>>,
    pub result_rx: Receiver<Box<crate::Result<Vec<PlateResult>>>>,
}

pub fn channel_pair() -> (SendState, AlprState) {
    let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    (SendState { frame_tx, result_rx }, AlprState { frame_rx, result_tx })
}

/// An [`Alpr`] running on its own thread. Results come back in submission order.
#[derive(Debug)]
pub struct AlprWorkerHandle {
    frame_tx: Option<Sender<Box<AlprImage>>>,
    result_rx: Receiver<Box<crate::Result<Vec<PlateResult>>>>,
    thread: Option<JoinHandle<()>>,
}

/// Moves `alpr` onto a dedicated thread that serves frames until the handle is dropped.
pub fn spawn_alpr_worker(mut alpr: Alpr) -> crate::Result<AlprWorkerHandle> {
    let (send_state, state) = channel_pair();
    let thread = std::thread::Builder::new()
        .name("alpr-worker".to_string())
        .spawn(move || {
            // ends once every sender is gone
            for frame in state.frame_rx.iter() {
                let result = alpr.predict(&frame);
                if state.result_tx.send(Box::new(result)).is_err() {
                    log::warn!("ALPR worker: result receiver dropped, stopping");
                    break;
                }
            }
            log::debug!("ALPR worker stopped");
        })?;

    Ok(AlprWorkerHandle {
        frame_tx: Some(send_state.frame_tx),
        result_rx: send_state.result_rx,
        thread: Some(thread),
    })
}

impl AlprWorkerHandle {
    pub fn submit(&self, frame: AlprImage) -> crate::Result<()> {
        let tx = self.frame_tx.as_ref().ok_or_else(worker_stopped)?;
        tx.send(Box::new(frame)).map_err(|_| worker_stopped())
    }

    /// Blocks until the next submitted frame has been processed.
    pub fn recv(&self) -> crate::Result<Vec<PlateResult>> {
        let result = self.result_rx.recv().map_err(|_| worker_stopped())?;
        *result
    }

    pub fn predict(&self, frame: AlprImage) -> crate::Result<Vec<PlateResult>> {
        self.submit(frame)?;
        self.recv()
    }

    /// Closes the frame channel and waits for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.frame_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("ALPR worker panicked");
            }
        }
    }
}

impl Drop for AlprWorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_stopped() -> AlprError {
    AlprError::Inference("ALPR worker is not running".to_string())
}
