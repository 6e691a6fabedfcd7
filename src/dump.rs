//! Linear dump of guest physical memory to a flat file.
//!
//! The output is the raw concatenation of every page from address 0 up to
//! the guest memory size, in ascending order. Pages the session cannot map
//! are written as zeros so every page lands at `index * page_size`. There is
//! no header; a reader needs the page size and memory size to interpret it.
//!
//! Any failure stops the sweep. Nothing is retried.
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::introspect::{ImageSession, IntrospectError, Introspector, PauseGuard};
use crate::memory::{page_addrs, page_count, PhysAddr};
use crate::target::Target;
use crate::util::{DumpProgress, MAX_OUTPUT_PATH_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Mapped,
    ZeroFill,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageKind::Mapped => write!(f, "page"),
            PageKind::ZeroFill => write!(f, "zero page"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("failed to initialize introspection session for {target}")]
    Init {
        target: String,
        #[source]
        source: IntrospectError,
    },
    #[error("failed to open {} for writing", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {kind} at {addr} to output")]
    Write {
        addr: PhysAddr,
        kind: PageKind,
        #[source]
        source: io::Error,
    },
    #[error("session returned {len} bytes for page at {addr}, expected {expected}")]
    PageLength {
        addr: PhysAddr,
        len: usize,
        expected: usize,
    },
    #[error("failed to flush output to disk")]
    Sync(#[source] io::Error),
    #[error("invalid page size {0}: must be a non-zero power of two")]
    PageSize(usize),
    #[error("failed to control guest execution")]
    GuestControl(#[source] IntrospectError),
}

impl DumpError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Init { .. } => 3,
            DumpError::OpenOutput { .. } => 4,
            DumpError::Write { .. } | DumpError::PageLength { .. } | DumpError::Sync(_) => 5,
            DumpError::PageSize(_) => 6,
            DumpError::GuestControl(_) => 7,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OutputPathError {
    #[error("output path is empty")]
    Empty,
    #[error("output path is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Validate the output path given on the command line.
pub fn parse_output_path(s: &str) -> Result<PathBuf, OutputPathError> {
    let len = s.chars().count();
    if len == 0 {
        return Err(OutputPathError::Empty);
    }
    if len > MAX_OUTPUT_PATH_LEN {
        return Err(OutputPathError::TooLong {
            len,
            max: MAX_OUTPUT_PATH_LEN,
        });
    }
    Ok(PathBuf::from(s))
}

/// Per-run counters collected by `sweep`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub pages_mapped: u64,
    pub pages_zero_filled: u64,
    pub bytes_written: u64,
    /// hex encoded SHA-256 of everything written
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DumpSummary {
    pub target: String,
    pub output: PathBuf,
    pub memsize: u64,
    pub page_size: usize,
    #[serde(flatten)]
    pub stats: SweepStats,
    pub started_at: String,
    pub finished_at: String,
}

#[derive(Clone, Default)]
pub struct DumpOptions {
    pub pause: bool,
    pub sync: bool,
    pub progress: Option<MultiProgress>,
}

fn write_page<W: Write>(
    output: &mut W,
    hasher: &mut Sha256,
    bytes: &[u8],
    addr: PhysAddr,
    kind: PageKind,
) -> Result<(), DumpError> {
    output
        .write_all(bytes)
        .map_err(|source| DumpError::Write { addr, kind, source })?;
    hasher.update(bytes);
    Ok(())
}

/// Write every page of `session` to `output`, zero filling unmapped pages.
///
/// Holds at most one guest page and one zero page at a time. Stops at the
/// first failed write; pages after it are never requested.
pub fn sweep<I: Introspector, W: Write>(
    session: &mut I,
    output: &mut W,
    progress: Option<&ProgressBar>,
) -> Result<SweepStats, DumpError> {
    let page_size = session.page_size();
    if !page_size.is_power_of_two() {
        return Err(DumpError::PageSize(page_size));
    }
    let memsize = session.memsize();
    let zero_page = vec![0u8; page_size];
    let mut hasher = Sha256::new();
    let mut stats = SweepStats::default();

    for addr in page_addrs(memsize, page_size) {
        debug_assert!(addr.is_aligned(page_size));
        trace!("dumping page at {}", addr);
        match session.access_page(addr) {
            Some(page) => {
                if page.len() != page_size {
                    return Err(DumpError::PageLength {
                        addr,
                        len: page.len(),
                        expected: page_size,
                    });
                }
                write_page(output, &mut hasher, &*page, addr, PageKind::Mapped)?;
                stats.pages_mapped += 1;
            }
            None => {
                debug!("page at {} is not mapped, writing zeros", addr);
                write_page(output, &mut hasher, &zero_page, addr, PageKind::ZeroFill)?;
                stats.pages_zero_filled += 1;
            }
        }
        stats.bytes_written += page_size as u64;
        if let Some(progress) = progress {
            progress.inc(page_size as u64);
        }
    }
    output.flush().map_err(DumpError::Sync)?;
    stats.sha256 = hex::encode(hasher.finalize());
    Ok(stats)
}

fn finish_output(
    file: &File,
    progress: Option<&ProgressBar>,
    sync: bool,
) -> Result<(), DumpError> {
    if let Some(progress) = progress {
        progress.finish();
    }
    if sync {
        file.sync_all().map_err(DumpError::Sync)?;
    }
    Ok(())
}

/// Dump an already initialized session to `output`.
///
/// Takes ownership of the session; it is closed when this returns, on
/// success or failure. The output file is created or truncated.
pub fn dump_session<I: Introspector>(
    mut session: I,
    target: &Target,
    output: &Path,
    options: &DumpOptions,
) -> Result<DumpSummary, DumpError> {
    let started_at = chrono::Local::now().to_rfc3339();
    let page_size = session.page_size();
    if !page_size.is_power_of_two() {
        return Err(DumpError::PageSize(page_size));
    }

    let mut file = File::create(output).map_err(|source| DumpError::OpenOutput {
        path: output.to_path_buf(),
        source,
    })?;

    let memsize = session.memsize();
    let pages = page_count(memsize, page_size);
    info!(
        "dumping {} ({} bytes, {} pages of {} bytes) to {}",
        target,
        memsize,
        pages,
        page_size,
        output.display()
    );

    let progress = options.progress.as_ref().map(|progress| {
        let bar = ProgressBar::new(pages * page_size as u64)
            .with_style(ProgressStyle::dump_bar(&target.to_string()));
        progress.add(bar)
    });

    // output is finished and synced before the guest resumes
    let stats = if options.pause {
        let mut guard = PauseGuard::new(&mut session).map_err(DumpError::GuestControl)?;
        let stats = sweep(&mut *guard, &mut file, progress.as_ref())?;
        finish_output(&file, progress.as_ref(), options.sync)?;
        guard.resume().map_err(DumpError::GuestControl)?;
        stats
    } else {
        let stats = sweep(&mut session, &mut file, progress.as_ref())?;
        finish_output(&file, progress.as_ref(), options.sync)?;
        stats
    };

    info!(
        "wrote {} bytes ({} mapped pages, {} zero filled), sha256 {}",
        stats.bytes_written, stats.pages_mapped, stats.pages_zero_filled, stats.sha256
    );
    Ok(DumpSummary {
        target: target.to_string(),
        output: output.to_path_buf(),
        memsize,
        page_size,
        stats,
        started_at,
        finished_at: chrono::Local::now().to_rfc3339(),
    })
}

/// Open a session on `target` and dump it to `output`.
pub fn dump_target(
    target: &Target,
    output: &Path,
    options: &DumpOptions,
) -> Result<DumpSummary, DumpError> {
    let init_failed = |source| DumpError::Init {
        target: target.to_string(),
        source,
    };
    match target {
        Target::Image(path) => {
            let session = ImageSession::open(path).map_err(init_failed)?;
            dump_session(session, target, output, options)
        }
        #[cfg(feature = "libvmi")]
        Target::Domain(domain) => {
            let session = crate::introspect::VmiSession::init(*domain).map_err(init_failed)?;
            dump_session(session, target, output, options)
        }
        #[cfg(not(feature = "libvmi"))]
        Target::Domain(_) => Err(init_failed(IntrospectError::Unsupported(
            "live domains need LibVMI; rebuild with --features libvmi",
        ))),
    }
}
