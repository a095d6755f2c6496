//! Background loading of audio files.
//!
//! Decoding and the first envelope build run on a tokio blocking worker so
//! the UI thread never waits on file I/O. Each load gets a generation number;
//! its result comes back through a one-shot channel. Starting a new load
//! cancels the one in flight and drops its receiver, so a superseded result
//! can never be delivered.
//!
//! ```ignore
//! let mut loader = Loader::new(Normalization::Peak);
//! let generation = loader.load(path, width, zoom);
//! view.begin_load(generation);
//!
//! // in the tick handler:
//! if let Some(result) = loader.try_recv() {
//!     view.deliver(result);
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::decode::{self, CancelFlag, DecodeError, SourceInfo};
use crate::waveform::{self, Envelope, Normalization, SampleBuffer};

/// A successfully loaded file.
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    pub buffer: Arc<SampleBuffer>,
    /// Envelope built on the worker for the width and zoom of the request
    pub envelope: Arc<Envelope>,
    pub source: SourceInfo,
}

/// Outcome of one load, tagged with its generation.
#[derive(Debug)]
pub struct LoadResult {
    pub generation: u64,
    pub path: PathBuf,
    pub outcome: Result<LoadedAudio, String>,
}

struct PendingLoad {
    generation: u64,
    cancel: CancelFlag,
    rx: oneshot::Receiver<LoadResult>,
}

/// Runs at most one load at a time, newest wins.
pub struct Loader {
    normalization: Normalization,
    next_generation: u64,
    pending: Option<PendingLoad>,
}

impl Loader {
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            next_generation: 1,
            pending: None,
        }
    }

    /// Starts loading `path` and returns the new generation.
    ///
    /// Any load still in flight is cancelled. Must be called from within a
    /// tokio runtime.
    pub fn load(&mut self, path: PathBuf, pixel_width: usize, zoom_factor: u32) -> u64 {
        self.spawn_load(path, pixel_width, zoom_factor, CancelFlag::new())
    }

    fn spawn_load(
        &mut self,
        path: PathBuf,
        pixel_width: usize,
        zoom_factor: u32,
        cancel: CancelFlag,
    ) -> u64 {
        self.cancel();

        let generation = self.next_generation;
        self.next_generation += 1;

        let (tx, rx) = oneshot::channel();
        let normalization = self.normalization;
        let worker_cancel = cancel.clone();

        tracing::info!("Loading {} (generation {})", path.display(), generation);

        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let outcome =
                load_blocking(&path, normalization, pixel_width, zoom_factor, &worker_cancel);

            match &outcome {
                Ok(loaded) => tracing::info!(
                    "Loaded {} in {:.1}ms: {} channels, {}Hz, {} frames",
                    path.display(),
                    started.elapsed().as_secs_f64() * 1000.0,
                    loaded.buffer.channel_count(),
                    loaded.buffer.sample_rate(),
                    loaded.buffer.frame_count()
                ),
                Err(DecodeError::Cancelled) => {
                    tracing::debug!(
                        "Load of {} cancelled (generation {})",
                        path.display(),
                        generation
                    );
                    return;
                }
                Err(e) => tracing::warn!("Failed to load {}: {}", path.display(), e),
            }

            let result = LoadResult {
                generation,
                path,
                outcome: outcome.map_err(|e| e.to_string()),
            };
            if tx.send(result).is_err() {
                tracing::debug!("Discarding superseded load (generation {})", generation);
            }
        });

        self.pending = Some(PendingLoad {
            generation,
            cancel,
            rx,
        });
        generation
    }

    /// Cancels the load in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Cancelling load (generation {})", pending.generation);
            pending.cancel.cancel();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the finished result without blocking.
    pub fn try_recv(&mut self) -> Option<LoadResult> {
        let pending = self.pending.as_mut()?;
        match pending.rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                // Worker exited without sending: it observed a cancel
                self.pending = None;
                None
            }
        }
    }

    /// Waits for the load in flight to finish.
    pub async fn recv(&mut self) -> Option<LoadResult> {
        let pending = self.pending.take()?;
        pending.rx.await.ok()
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Decodes `path` and builds its first envelope.
pub fn load_blocking(
    path: &std::path::Path,
    normalization: Normalization,
    pixel_width: usize,
    zoom_factor: u32,
    cancel: &CancelFlag,
) -> Result<LoadedAudio, DecodeError> {
    let decoded = decode::decode_file(path, normalization, cancel)?;
    let envelope = waveform::build(&decoded.buffer, pixel_width, zoom_factor);
    cancel.check()?;

    Ok(LoadedAudio {
        buffer: Arc::new(decoded.buffer),
        envelope: Arc::new(envelope),
        source: decoded.source,
    })
}
