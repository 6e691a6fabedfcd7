pub const PAGE_SHIFT: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Longest output path accepted on the command line.
pub const MAX_OUTPUT_PATH_LEN: usize = 50;
