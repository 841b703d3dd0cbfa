//! Cooperative abort signal.
//!
//! Nothing is interrupted mid-call. Population checks the flag before every
//! batch and the runner checks it before every scenario.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Shared flag raised by SIGINT/SIGTERM or by [`AbortFlag::raise`].
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag for every clone.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises this flag when the process receives SIGINT or SIGTERM.
    pub fn register_signal_handlers(&self) -> std::io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.0))?;
        }
        tracing::debug!("abort flag registered for SIGINT and SIGTERM");
        Ok(())
    }
}
