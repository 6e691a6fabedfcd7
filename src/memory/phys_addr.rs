use serde::Serialize;

/// A guest physical address.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(u64);

impl PhysAddr {
    pub fn new(addr: u64) -> Self {
        PhysAddr(addr)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// `true` if the address sits on a `page_size` boundary.
    ///
    /// `page_size` must be a power of two.
    pub fn is_aligned(&self, page_size: usize) -> bool {
        self.0 & (page_size as u64 - 1) == 0
    }

    /// Index of the page containing this address.
    pub fn page_index(&self, page_size: usize) -> u64 {
        self.0 / page_size as u64
    }
}

/// Number of `page_size` pages needed to cover `memsize` bytes.
pub fn page_count(memsize: u64, page_size: usize) -> u64 {
    memsize.div_ceil(page_size as u64)
}

/// Iterate the page-aligned addresses covering `[0, memsize)`.
pub fn page_addrs(memsize: u64, page_size: usize) -> impl Iterator<Item = PhysAddr> {
    (0..memsize).step_by(page_size).map(PhysAddr)
}

impl std::fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
