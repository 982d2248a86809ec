//! Immersive mode hooks.
//!
//! The host environment (fullscreen window, hidden cursor, terminal
//! alternate screen) is acquired while a session runs. The session clock
//! owns the lease and releases it on every path out of `Running`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// The host refused to enter immersive mode
    #[error("immersive mode refused: {0}")]
    Refused(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait FocusEnvironment: Send {
    fn enter_immersive(&mut self) -> Result<(), EnvironmentError>;

    /// Must tolerate being called when immersive mode was already lost.
    fn exit_immersive(&mut self);
}

/// Environment with nothing to acquire.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl FocusEnvironment for Headless {
    fn enter_immersive(&mut self) -> Result<(), EnvironmentError> {
        Ok(())
    }

    fn exit_immersive(&mut self) {}
}

/// Tracks whether the session currently holds immersive mode.
pub(crate) struct ImmersiveLease {
    env: Box<dyn FocusEnvironment>,
    held: bool,
}

impl ImmersiveLease {
    pub(crate) fn new(env: Box<dyn FocusEnvironment>) -> Self {
        Self { env, held: false }
    }

    pub(crate) fn acquire(&mut self) {
        if self.held {
            return;
        }
        match self.env.enter_immersive() {
            Ok(()) => self.held = true,
            // The session keeps running without it.
            Err(e) => tracing::warn!("immersive mode unavailable: {e}"),
        }
    }

    pub(crate) fn release(&mut self) {
        if self.held {
            self.env.exit_immersive();
            self.held = false;
        }
    }

    pub(crate) fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for ImmersiveLease {
    fn drop(&mut self) {
        self.release();
    }
}
