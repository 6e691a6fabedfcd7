use std::ops::{Deref, DerefMut};

use super::{IntrospectError, Introspector};

/// Keeps the guest paused while alive.
///
/// The guest is resumed when the guard drops. A failed resume is only logged
/// there; call `resume` to observe it.
pub struct PauseGuard<'s, I: Introspector> {
    session: &'s mut I,
    paused: bool,
}

impl<'s, I: Introspector> PauseGuard<'s, I> {
    pub fn new(session: &'s mut I) -> Result<Self, IntrospectError> {
        session.pause()?;
        debug!("guest paused");
        Ok(PauseGuard {
            session,
            paused: true,
        })
    }

    /// Resume the guest now, reporting failure.
    pub fn resume(mut self) -> Result<(), IntrospectError> {
        self.paused = false;
        self.session.resume()?;
        debug!("guest resumed");
        Ok(())
    }
}

impl<I: Introspector> Deref for PauseGuard<'_, I> {
    type Target = I;

    fn deref(&self) -> &I {
        self.session
    }
}

impl<I: Introspector> DerefMut for PauseGuard<'_, I> {
    fn deref_mut(&mut self) -> &mut I {
        self.session
    }
}

impl<I: Introspector> Drop for PauseGuard<'_, I> {
    fn drop(&mut self) {
        if !self.paused {
            return;
        }
        match self.session.resume() {
            Ok(()) => debug!("guest resumed"),
            Err(e) => error!("{}", e),
        }
    }
}
