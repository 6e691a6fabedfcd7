//! Guest physical address handling.
mod phys_addr;

pub use self::phys_addr::{page_addrs, page_count, PhysAddr};
