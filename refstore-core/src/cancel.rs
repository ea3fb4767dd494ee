use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal polled by long-running scans between steps.
///
/// `Cancellation::default()` is the same as [`Cancellation::never`].
///
/// Clones share the same flag, so one handle can be given to a scan and
/// another kept by whoever decides to stop it.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Option<Arc<AtomicBool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// A token that can never be cancelled.
    pub fn never() -> Self {
        Self { flag: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Acquire))
    }

    /// Returns `true` if this call is the one that flipped the flag.
    pub fn cancel(&self) -> bool {
        match &self.flag {
            Some(flag) => flag
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            None => false,
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
