//! # Barcode Source
//!
//! Produces barcode strings from a camera decoder or from typed input.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BarcodeScanner                                   │
//! │                                                                         │
//! │   status: Idle                                                          │
//! │      │ open()                                                           │
//! │      ▼                                                                  │
//! │   status: Initializing ── decoder.start() fails ──► release device      │
//! │      │                                              status: Device-     │
//! │      │ started                                      Unavailable(reason) │
//! │      ▼                                                                  │
//! │   status: Scanning                                                      │
//! │      │  ScanSession::next() / into_stream()                             │
//! │      │  yields trimmed, non-empty codes                                 │
//! │      │                                                                  │
//! │      │ feed ends, session dropped, or stream dropped                    │
//! │      ▼                                                                  │
//! │   release device, status: Idle  (open() may be called again)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only one session exists at a time: the capture device is owned by the
//! session's lock guard, so a second `open()` fails with
//! [`ScanError::DeviceBusy`] until the first session is gone.

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

// =============================================================================
// Errors and Status
// =============================================================================

/// Barcode source errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The capture device could not be acquired.
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Another session holds the device.
    #[error("A scan session is already active")]
    DeviceBusy,

    /// The manual entry channel has no reader left.
    #[error("Barcode source closed")]
    Closed,
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Observable state of a [`BarcodeScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Idle,
    /// The device is being acquired. Not an error.
    Initializing,
    Scanning,
    DeviceUnavailable(String),
}

// =============================================================================
// Video Decoder Capability
// =============================================================================

/// A camera feed that reports decoded barcodes.
///
/// Frame decoding itself lives behind this trait.
#[async_trait]
pub trait VideoDecoder: Send {
    /// Acquires the capture device.
    async fn start(&mut self) -> ScanResult<()>;

    /// Waits for the next decoded code. `None` when the feed has ended.
    async fn next_detection(&mut self) -> Option<String>;

    /// Frees the capture device. Called on every exit path and must tolerate
    /// repeated calls.
    fn release(&mut self);
}

enum Capability {
    Video(Box<dyn VideoDecoder>),
    Manual(mpsc::Receiver<String>),
}

// =============================================================================
// Manual Entry
// =============================================================================

/// Sender half for typed barcodes.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    tx: mpsc::Sender<String>,
}

impl ManualEntry {
    /// Queues one typed code. Blank input is ignored.
    pub async fn submit(&self, text: &str) -> ScanResult<()> {
        let code = text.trim();
        if code.is_empty() {
            debug!("Ignoring blank manual entry");
            return Ok(());
        }
        self.tx
            .send(code.to_string())
            .await
            .map_err(|_| ScanError::Closed)
    }
}

// =============================================================================
// Barcode Scanner
// =============================================================================

/// Owner of one barcode capability.
pub struct BarcodeScanner {
    capability: Arc<Mutex<Capability>>,
    status: Arc<watch::Sender<ScanStatus>>,
}

impl BarcodeScanner {
    /// Scanner backed by a camera decoder.
    pub fn video(decoder: impl VideoDecoder + 'static) -> Self {
        Self::with_capability(Capability::Video(Box::new(decoder)))
    }

    /// Scanner fed by typed input, plus the handle that types into it.
    pub fn manual() -> (Self, ManualEntry) {
        let (tx, rx) = mpsc::channel(32);
        (Self::with_capability(Capability::Manual(rx)), ManualEntry { tx })
    }

    fn with_capability(capability: Capability) -> Self {
        let (status, _) = watch::channel(ScanStatus::Idle);
        Self {
            capability: Arc::new(Mutex::new(capability)),
            status: Arc::new(status),
        }
    }

    /// Subscribes to status changes.
    pub fn status(&self) -> watch::Receiver<ScanStatus> {
        self.status.subscribe()
    }

    /// Starts a session, acquiring the device.
    ///
    /// On a start failure the device is released before returning and the
    /// status reads `DeviceUnavailable`.
    pub async fn open(&self) -> ScanResult<ScanSession> {
        let guard = Arc::clone(&self.capability)
            .try_lock_owned()
            .map_err(|_| ScanError::DeviceBusy)?;

        self.status.send_replace(ScanStatus::Initializing);
        let mut session = ScanSession {
            guard,
            status: Arc::clone(&self.status),
            finished: false,
        };

        if let Capability::Video(decoder) = &mut *session.guard {
            if let Err(e) = decoder.start().await {
                let reason = match e {
                    ScanError::DeviceUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                warn!(%reason, "Capture device unavailable");
                decoder.release();
                session.finished = true;
                session
                    .status
                    .send_replace(ScanStatus::DeviceUnavailable(reason.clone()));
                return Err(ScanError::DeviceUnavailable(reason));
            }
        }

        info!("Scan session started");
        self.status.send_replace(ScanStatus::Scanning);
        Ok(session)
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// An active scan. Holds the device until it ends or is dropped.
pub struct ScanSession {
    guard: OwnedMutexGuard<Capability>,
    status: Arc<watch::Sender<ScanStatus>>,
    finished: bool,
}

impl ScanSession {
    /// Waits for the next code. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<String> {
        while !self.finished {
            let raw = match &mut *self.guard {
                Capability::Video(decoder) => decoder.next_detection().await,
                Capability::Manual(rx) => rx.recv().await,
            };

            match raw {
                Some(code) => {
                    let code = code.trim();
                    if !code.is_empty() {
                        debug!(barcode = %code, "Barcode detected");
                        return Some(code.to_string());
                    }
                }
                None => self.finish(),
            }
        }
        None
    }

    /// The session as a stream of codes. Dropping the stream ends the session.
    pub fn into_stream(self) -> impl Stream<Item = String> + Send {
        stream::unfold(self, |mut session| async move {
            session.next().await.map(|code| (code, session))
        })
    }

    /// Ends the session now.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Capability::Video(decoder) = &mut *self.guard {
            decoder.release();
        }
        self.status.send_replace(ScanStatus::Idle);
        info!("Scan session ended");
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.finish();
    }
}
