//! Access to guest physical memory through an introspection session.
//!
//! An `Introspector` is one open session on one target. Opening it is the
//! backend's constructor and closing it is its `Drop`, so a session is torn
//! down exactly once no matter how the caller exits. Pages handed out by
//! `access_page` borrow the session and are released when dropped.
//!
//! Backends:
//! - `ImageSession`: a raw physical memory image on disk.
//! - `VmiSession` (feature `libvmi`): a live domain through LibVMI.
mod image;
#[cfg(feature = "libvmi")]
mod libvmi;
mod pause;

use std::ops::Deref;

use thiserror::Error;

use crate::memory::PhysAddr;
use crate::util::PAGE_SIZE;

pub use self::image::ImageSession;
#[cfg(feature = "libvmi")]
pub use self::libvmi::VmiSession;
pub use self::pause::PauseGuard;

#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("failed to initialize session for {domain}: {reason}")]
    Init { domain: String, reason: String },
    #[error("{0}")]
    Unsupported(&'static str),
    #[error("failed to pause the guest")]
    Pause,
    #[error("failed to resume the guest")]
    Resume,
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Introspector {
    /// A view of one guest page. Released when dropped.
    type Page<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    /// Guest memory size in bytes.
    fn memsize(&self) -> u64;

    /// Granularity of `access_page`.
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    /// Fetch the page at `addr`, or `None` if it is not mapped.
    ///
    /// `addr` is page aligned. A returned page holds exactly `page_size()` bytes.
    fn access_page(&mut self, addr: PhysAddr) -> Option<Self::Page<'_>>;

    fn pause(&mut self) -> Result<(), IntrospectError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), IntrospectError> {
        Ok(())
    }
}
