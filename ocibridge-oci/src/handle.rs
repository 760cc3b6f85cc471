use crate::OciNative;
use std::{fmt, rc::Rc};

/// Native handle released exactly once: explicitly through [`Owned::release`]
/// or, as a backstop, when dropped.
pub(crate) struct Owned<N: OciNative, H: Copy + fmt::Debug> {
    native: Rc<N>,
    handle: Option<H>,
    release: fn(&N, H) -> bool,
}

impl<N: OciNative, H: Copy + fmt::Debug> Owned<N, H> {
    pub(crate) fn new(native: Rc<N>, handle: H, release: fn(&N, H) -> bool) -> Self {
        Self {
            native,
            handle: Some(handle),
            release,
        }
    }

    pub(crate) fn get(&self) -> Option<H> {
        self.handle
    }

    /// Releases the handle, `None` if it was already released.
    pub(crate) fn release(&mut self) -> Option<bool> {
        let handle = self.handle.take()?;
        Some((self.release)(&self.native, handle))
    }
}

impl<N: OciNative, H: Copy + fmt::Debug> Drop for Owned<N, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            if !(self.release)(&self.native, handle) {
                log::warn!("Could not release the native handle {:?}", handle);
            }
        }
    }
}

impl<N: OciNative, H: Copy + fmt::Debug> fmt::Debug for Owned<N, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle {
            Some(handle) => write!(f, "Owned({:?})", handle),
            None => f.write_str("Owned(released)"),
        }
    }
}
