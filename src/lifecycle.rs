//! Mount/unmount lifecycle for the in-page overlay toolbar.
//!
//! Mounting is asynchronous and potentially slow (the host builds real UI),
//! while enable/disable requests can arrive in any interleaving: rapid
//! toggles, a disable landing mid-mount, a dispose racing a mount. The
//! controller guarantees that at most one mount attempt is in flight
//! system-wide, that two live handles never coexist, and that every handle is
//! released exactly once.
//!
//! The mechanism is an intent flag recorded synchronously on every call, a
//! single-slot shared in-flight future joined by concurrent `enable()`s, and
//! a synchronous intent recheck at the moment the mount resolves. Execution
//! is single-threaded cooperative; the mutex below is never held across an
//! await.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::warn;

use crate::{Error, Result};

/// A mounted overlay resource. Released exactly once via [`remove`].
///
/// [`remove`]: ToolbarHandle::remove
pub trait ToolbarHandle: Send {
    fn remove(&mut self) -> Result<()>;
}

/// The consumed mount boundary: builds the overlay UI and hands back a
/// handle. This crate never constructs UI itself.
pub trait ToolbarMounter: Send + Sync {
    fn mount(&self) -> BoxFuture<'_, Result<Box<dyn ToolbarHandle>>>;
}

/// Outcome shared between every `enable()` joined on one mount attempt.
type MountOutcome = std::result::Result<(), Arc<Error>>;
type InFlightMount = Shared<BoxFuture<'static, MountOutcome>>;

struct State {
    /// The caller's most recently expressed desired state.
    should_be_enabled: bool,
    /// Terminal flag; once set, `enable()` is permanently a no-op.
    disposed: bool,
    mounted: Option<Box<dyn ToolbarHandle>>,
    in_flight: Option<InFlightMount>,
}

/// Owns the overlay's mount state machine: Idle, Mounting, Mounted, Disposed.
pub struct ToolbarLifecycle {
    mounter: Arc<dyn ToolbarMounter>,
    state: Arc<Mutex<State>>,
}

impl ToolbarLifecycle {
    pub fn new(mounter: Arc<dyn ToolbarMounter>) -> Self {
        Self {
            mounter,
            state: Arc::new(Mutex::new(State {
                should_be_enabled: false,
                disposed: false,
                mounted: None,
                in_flight: None,
            })),
        }
    }

    /// Request the overlay to be shown.
    ///
    /// Idempotent while mounted; joins the in-flight mount instead of
    /// starting a second one. If intent reverted (or the controller was
    /// disposed) by the time the mount resolves, the fresh handle is
    /// safe-released and the mounted state stays empty.
    pub async fn enable(&self) -> Result<()> {
        let mount = {
            let mut state = self.state.lock().unwrap();
            if state.disposed {
                return Ok(());
            }
            state.should_be_enabled = true;
            if state.mounted.is_some() {
                return Ok(());
            }
            match &state.in_flight {
                Some(existing) => existing.clone(),
                None => {
                    let task = Self::run_mount(self.mounter.clone(), self.state.clone())
                        .boxed()
                        .shared();
                    state.in_flight = Some(task.clone());
                    task
                }
            }
        };

        mount.await.map_err(|e| match &*e {
            Error::MountError(msg) => Error::MountError(msg.clone()),
            other => Error::MountError(other.to_string()),
        })
    }

    /// Request the overlay to be hidden. Synchronous.
    ///
    /// The handle is detached from tracked state before it is released, so a
    /// concurrent `enable()` can never observe a handle mid-release.
    pub fn disable(&self) {
        let detached = {
            let mut state = self.state.lock().unwrap();
            state.should_be_enabled = false;
            state.mounted.take()
        };
        if let Some(handle) = detached {
            safe_release(handle);
        }
    }

    /// Terminal shutdown: after this, `enable()` is permanently a no-op.
    pub fn dispose(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.disposed = true;
        }
        self.disable();
    }

    /// True iff a handle is currently tracked.
    pub fn is_mounted(&self) -> bool {
        self.state.lock().unwrap().mounted.is_some()
    }

    /// The single mount attempt backing one in-flight window. Rechecks intent
    /// flags synchronously at resolution; the last intent expressed before
    /// resumption wins.
    async fn run_mount(mounter: Arc<dyn ToolbarMounter>, state: Arc<Mutex<State>>) -> MountOutcome {
        let result = mounter.mount().await;

        let mut guard = state.lock().unwrap();
        guard.in_flight = None;
        match result {
            Ok(handle) => {
                if guard.disposed || !guard.should_be_enabled {
                    drop(guard);
                    safe_release(handle);
                } else {
                    guard.mounted = Some(handle);
                }
                Ok(())
            }
            Err(e) => Err(Arc::new(e)),
        }
    }
}

/// Release a handle, logging instead of propagating any failure.
fn safe_release(mut handle: Box<dyn ToolbarHandle>) {
    if let Err(e) = handle.remove() {
        warn!("Toolbar handle release failed: {}", e);
    }
}
