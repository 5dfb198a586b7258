use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;
use trackread_core::{BlockDevice, Geometry};

use crate::infer_geometry;

/// A disk image file, memory-mapped read-only.
///
/// An empty image behaves like a drive without a disk: it reports the
/// nominal Amiga DD geometry and no media.
#[derive(Debug)]
pub struct ImageDevice {
    mmap: Option<Mmap>,
    name: String,
    size: u64,
}

impl ImageDevice {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        let mmap = if size == 0 {
            None
        } else {
            let mmap = unsafe { Mmap::map(&file) }?;

            #[cfg(target_os = "linux")]
            {
                use memmap2::Advice;
                let _ = mmap.advise(Advice::Sequential);
                let _ = mmap.advise(Advice::WillNeed);
            }

            Some(mmap)
        };

        let name = path.display().to_string();
        debug!(image = %name, size, "mapped disk image");

        Ok(Self { mmap, name, size })
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let mmap = self.mmap.as_ref()?;
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(len)?;
        mmap.get(start..end)
    }
}

impl BlockDevice for ImageDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        if self.size == 0 {
            return Ok(Geometry::AMIGA_DD);
        }
        infer_geometry(self.size)
    }

    fn media_present(&mut self) -> io::Result<bool> {
        Ok(self.size > 0)
    }

    fn read_block(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        let block = self
            .slice(offset, buffer.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buffer.copy_from_slice(block);
        Ok(())
    }

    fn stop_motor(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(self) {
        debug!(image = %self.name, "unmapping disk image");
    }
}
