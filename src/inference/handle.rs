//! Detector availability tracking.
//!
//! Model loading can take seconds, and scans may start before it finishes.
//! `DetectorHandle` tracks the loading state and gives the orchestrator a
//! single bounded, cancellable blocking call to wait on: no polling
//! intervals, no callbacks. On timeout the caller degrades to a failure
//! result instead of crashing.

use crate::core::errors::ScanError;
use crate::core::traits::RegionDetector;
use crate::inference::QrDetector;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Granularity of the cancellation check while waiting on the condvar.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// A cancellation token for an in-flight scan.
///
/// Cloning shares the flag, so the token handed to a scan call and the
/// one kept by the caller observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the work holding this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

enum DetectorState {
    /// No model has been configured.
    Unloaded,
    /// A load is in progress; waiters block until it resolves.
    Loading,
    /// The model is ready for inference.
    Ready(Arc<dyn RegionDetector>),
    /// The load failed; waiters resolve immediately to unavailable.
    Failed(String),
}

impl std::fmt::Debug for DetectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorState::Unloaded => write!(f, "Unloaded"),
            DetectorState::Loading => write!(f, "Loading"),
            DetectorState::Ready(_) => write!(f, "Ready"),
            DetectorState::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

/// Shared handle to the (possibly still loading) detector.
#[derive(Debug)]
pub struct DetectorHandle {
    state: Mutex<DetectorState>,
    changed: Condvar,
}

impl Default for DetectorHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorHandle {
    /// Creates a handle with no model configured.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DetectorState::Unloaded),
            changed: Condvar::new(),
        }
    }

    /// Creates a handle that is immediately ready.
    pub fn ready(detector: impl RegionDetector + 'static) -> Self {
        Self {
            state: Mutex::new(DetectorState::Ready(Arc::new(detector))),
            changed: Condvar::new(),
        }
    }

    /// Marks the handle as loading. Subsequent `wait_ready` calls block
    /// until the load resolves.
    pub fn begin_loading(&self) {
        *self.state.lock().unwrap() = DetectorState::Loading;
        self.changed.notify_all();
    }

    /// Installs a loaded detector and wakes every waiter.
    pub fn set_ready(&self, detector: impl RegionDetector + 'static) {
        *self.state.lock().unwrap() = DetectorState::Ready(Arc::new(detector));
        self.changed.notify_all();
    }

    /// Records a load failure and wakes every waiter.
    pub fn set_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("detector load failed: {reason}");
        *self.state.lock().unwrap() = DetectorState::Failed(reason);
        self.changed.notify_all();
    }

    /// Loads a model file on a background thread, resolving this handle
    /// when done.
    pub fn load_in_background(self: &Arc<Self>, model_path: PathBuf) {
        self.begin_loading();
        let handle = Arc::clone(self);
        std::thread::spawn(move || {
            debug!("loading detector model from {}", model_path.display());
            match QrDetector::from_file(&model_path) {
                Ok(detector) => handle.set_ready(detector),
                Err(e) => handle.set_failed(e.to_string()),
            }
        });
    }

    /// Returns true when a model is configured (loading, ready, or
    /// failed), i.e. when waiting could be worthwhile.
    pub fn is_configured(&self) -> bool {
        !matches!(*self.state.lock().unwrap(), DetectorState::Unloaded)
    }

    /// Blocks until the detector is ready, the deadline passes, or the
    /// scan is cancelled.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Ceiling on the total wait.
    /// * `cancel` - Token checked while waiting; cancellation resolves
    ///   the wait early.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ModelUnavailable` when no model is configured,
    /// the load failed, the deadline passed, or the wait was cancelled.
    pub fn wait_ready(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Arc<dyn RegionDetector>, ScanError> {
        let start = Instant::now();
        let mut state = self.state.lock().unwrap();

        loop {
            match &*state {
                DetectorState::Ready(detector) => return Ok(Arc::clone(detector)),
                DetectorState::Unloaded | DetectorState::Failed(_) => {
                    return Err(ScanError::ModelUnavailable {
                        waited: start.elapsed(),
                    });
                }
                DetectorState::Loading => {}
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout || cancel.is_cancelled() {
                return Err(ScanError::ModelUnavailable { waited: elapsed });
            }

            let slice = WAIT_SLICE.min(timeout - elapsed);
            let (guard, _timed_out) = self.changed.wait_timeout(state, slice).unwrap();
            state = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_handle_is_unavailable_immediately() {
        let handle = DetectorHandle::new();
        let start = Instant::now();
        let result = handle.wait_ready(Duration::from_secs(10), &CancelToken::new());
        assert!(matches!(result, Err(ScanError::ModelUnavailable { .. })));
        // No model will ever arrive; the wait must not consume the ceiling.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_loading_times_out() {
        let handle = DetectorHandle::new();
        handle.begin_loading();
        let result = handle.wait_ready(Duration::from_millis(120), &CancelToken::new());
        match result {
            Err(ScanError::ModelUnavailable { waited }) => {
                assert!(waited >= Duration::from_millis(120));
            }
            Err(other) => panic!("expected ModelUnavailable, got {other:?}"),
            Ok(_) => panic!("expected ModelUnavailable, got Ok(detector)"),
        }
    }

    #[test]
    fn test_cancellation_ends_wait_early() {
        let handle = Arc::new(DetectorHandle::new());
        handle.begin_loading();
        let cancel = CancelToken::new();

        let canceller = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            canceller.cancel();
        });

        let start = Instant::now();
        let result = handle.wait_ready(Duration::from_secs(30), &cancel);
        assert!(matches!(result, Err(ScanError::ModelUnavailable { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_failed_load_resolves_waiters() {
        let handle = DetectorHandle::new();
        handle.begin_loading();
        handle.set_failed("model file truncated");
        let result = handle.wait_ready(Duration::from_secs(10), &CancelToken::new());
        assert!(matches!(result, Err(ScanError::ModelUnavailable { .. })));
    }
}
