use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::{IntrospectError, Introspector};
use crate::memory::PhysAddr;

/// A session over a raw physical memory image.
///
/// Guest memory size is the image length. A trailing partial page is
/// returned zero padded.
pub struct ImageSession {
    path: PathBuf,
    // empty images cannot be mapped
    mmap: Option<Mmap>,
}

impl ImageSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IntrospectError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| IntrospectError::Init {
            domain: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let len = file.metadata()?.len();
        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the image is opened read-only and is not expected to be
            // truncated while the session is open.
            Some(unsafe { Mmap::map(&file)? })
        };
        info!("opened memory image {} ({} bytes)", path.display(), len);
        Ok(ImageSession { path, mmap })
    }

    fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

impl Introspector for ImageSession {
    type Page<'a> = Cow<'a, [u8]>;

    fn memsize(&self) -> u64 {
        self.bytes().len() as u64
    }

    fn access_page(&mut self, addr: PhysAddr) -> Option<Self::Page<'_>> {
        let bytes = self.bytes();
        let start = usize::try_from(addr.as_u64()).ok()?;
        if start >= bytes.len() {
            return None;
        }
        let page_size = self.page_size();
        let end = start.saturating_add(page_size);
        if end <= bytes.len() {
            return Some(Cow::Borrowed(&bytes[start..end]));
        }
        let mut page = vec![0u8; page_size];
        page[..bytes.len() - start].copy_from_slice(&bytes[start..]);
        Some(Cow::Owned(page))
    }
}

impl Drop for ImageSession {
    fn drop(&mut self) {
        debug!("closed memory image {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::util::PAGE_SIZE;

    fn image(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_full_pages_are_borrowed() {
        let mut content = vec![0xAA; PAGE_SIZE];
        content.extend(vec![0xBB; PAGE_SIZE]);
        let f = image(&content);
        let mut session = ImageSession::open(f.path()).unwrap();
        assert_eq!(session.memsize(), 2 * PAGE_SIZE as u64);

        let page = session.access_page(PhysAddr::new(PAGE_SIZE as u64)).unwrap();
        assert!(matches!(page, Cow::Borrowed(_)));
        assert_eq!(&*page, &content[PAGE_SIZE..]);
    }

    #[test]
    fn test_partial_tail_page_is_padded() {
        let f = image(&[0xCC; PAGE_SIZE + 10]);
        let mut session = ImageSession::open(f.path()).unwrap();

        let page = session.access_page(PhysAddr::new(PAGE_SIZE as u64)).unwrap();
        assert_eq!(page.len(), PAGE_SIZE);
        assert!(page[..10].iter().all(|&b| b == 0xCC));
        assert!(page[10..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_past_end_is_unmapped() {
        let f = image(&[0x11; PAGE_SIZE]);
        let mut session = ImageSession::open(f.path()).unwrap();
        assert!(session.access_page(PhysAddr::new(PAGE_SIZE as u64)).is_none());
    }

    #[test]
    fn test_empty_image() {
        let f = image(&[]);
        let mut session = ImageSession::open(f.path()).unwrap();
        assert_eq!(session.memsize(), 0);
        assert!(session.access_page(PhysAddr::new(0)).is_none());
    }

    #[test]
    fn test_missing_image_fails_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageSession::open(dir.path().join("missing.raw"))
            .err()
            .unwrap();
        assert!(matches!(err, IntrospectError::Init { .. }));
    }
}
