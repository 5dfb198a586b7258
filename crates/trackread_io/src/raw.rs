//! Direct access to a floppy drive or any other block device node.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use trackread_core::{BlockDevice, Geometry};

use crate::{infer_geometry, ioctl};

/// Device number major of the Linux floppy driver.
pub const FLOPPY_MAJOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A drive handled by the floppy driver.
    Floppy,
    /// Any other block device.
    Block,
    /// A regular file or anything else readable.
    File,
}

/// Read-only handle on a device node.
///
/// `O_DIRECT` is attempted first so reads bypass the page cache and reach
/// the medium; nodes that refuse it are reopened normally. On Linux every
/// open carries `O_NONBLOCK`, so the floppy driver hands out a handle on an
/// empty drive and the missing disk shows up in the size query instead.
#[derive(Debug)]
pub struct RawDevice {
    file: File,
    path: PathBuf,
    name: String,
    kind: NodeKind,
    direct_io: bool,
}

impl RawDevice {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open_with_options(path, true)
    }

    /// Opens through the page cache, without `O_DIRECT`.
    pub fn open_regular(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open_with_options(path, false)
    }

    fn open_with_options(path: impl AsRef<Path>, direct_io: bool) -> io::Result<Self> {
        let path = path.as_ref();

        #[cfg(target_os = "linux")]
        let (file, direct_io) = {
            use std::os::unix::fs::OpenOptionsExt;

            let plain = || {
                OpenOptions::new()
                    .read(true)
                    .custom_flags(libc::O_NONBLOCK)
                    .open(path)
            };
            if direct_io {
                match OpenOptions::new()
                    .read(true)
                    .custom_flags(libc::O_DIRECT | libc::O_NONBLOCK)
                    .open(path)
                {
                    Ok(f) => (f, true),
                    Err(_) => (plain()?, false),
                }
            } else {
                (plain()?, false)
            }
        };

        #[cfg(not(target_os = "linux"))]
        let (file, direct_io) = {
            let _ = direct_io;
            (OpenOptions::new().read(true).open(path)?, false)
        };

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{Advice, fadvise};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
            let _ = fadvise(&file, 0, None, Advice::NoReuse);
        }

        let kind = node_kind(&file)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(device = %name, ?kind, direct_io, "opened device node");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            name,
            kind,
            direct_io,
        })
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn uses_direct_io(&self) -> bool {
        self.direct_io
    }

    fn size_in_bytes(&self) -> io::Result<u64> {
        match self.kind {
            NodeKind::File => Ok(self.file.metadata()?.len()),
            NodeKind::Floppy | NodeKind::Block => ioctl::size_in_bytes(&self.file),
        }
    }
}

#[cfg(unix)]
fn node_kind(file: &File) -> io::Result<NodeKind> {
    use std::os::unix::fs::{FileTypeExt, MetadataExt};

    let metadata = file.metadata()?;
    if !metadata.file_type().is_block_device() {
        return Ok(NodeKind::File);
    }
    if rustix::fs::major(metadata.rdev() as _) == FLOPPY_MAJOR {
        Ok(NodeKind::Floppy)
    } else {
        Ok(NodeKind::Block)
    }
}

#[cfg(not(unix))]
fn node_kind(_file: &File) -> io::Result<NodeKind> {
    Ok(NodeKind::File)
}

impl BlockDevice for RawDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        if self.kind == NodeKind::File {
            return match self.size_in_bytes()? {
                0 => Ok(Geometry::AMIGA_DD),
                len => infer_geometry(len),
            };
        }

        // An empty drive still knows its nominal layout.
        let bytes = match self.size_in_bytes() {
            Ok(bytes) => Some(bytes),
            Err(err) if ioctl::is_no_medium(&err) => None,
            Err(err) => return Err(err),
        };

        match ioctl::chs(&self.file) {
            Ok((cylinders, heads, sectors)) if heads > 0 && sectors > 0 => {
                let sector_size = ioctl::logical_sector_size(&self.file)?;
                let geometry = Geometry::new(sector_size, cylinders, heads, sectors);
                Ok(match bytes {
                    Some(bytes) => {
                        geometry.with_total_sectors(bytes / u64::from(sector_size.max(1)))
                    }
                    None => geometry,
                })
            }
            Ok(_) => infer_geometry(bytes.unwrap_or(0)),
            Err(err) if ioctl::is_no_medium(&err) && self.kind == NodeKind::Floppy => {
                Ok(Geometry::PC_1440K)
            }
            Err(err) if ioctl::is_not_a_block_device(&err) => match bytes {
                Some(bytes) => infer_geometry(bytes),
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    fn media_present(&mut self) -> io::Result<bool> {
        match self.size_in_bytes() {
            Ok(size) => Ok(size > 0),
            Err(err) if ioctl::is_no_medium(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read_block(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(buffer, offset)
        }

        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(buffer)
        }
    }

    fn stop_motor(&mut self) -> io::Result<()> {
        if self.kind == NodeKind::Floppy {
            debug!(device = %self.name, "flushing floppy driver");
            ioctl::flush_floppy(&self.file)?;
        }
        Ok(())
    }

    fn close(self) {
        debug!(device = %self.name, "closing device node");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn image(len: usize) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i / 512) as u8).collect();
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_regular_file_geometry_is_inferred() {
        let temp_file = image(901_120);
        let mut device = RawDevice::open_regular(temp_file.path()).unwrap();

        assert_eq!(device.kind(), NodeKind::File);
        assert!(!device.uses_direct_io());
        assert_eq!(device.geometry().unwrap(), Geometry::AMIGA_DD);
        assert!(device.media_present().unwrap());
    }

    #[test]
    fn test_read_block_is_positioned() {
        let temp_file = image(901_120);
        let mut device = RawDevice::open_regular(temp_file.path()).unwrap();

        let mut buffer = vec![0u8; 512];
        device.read_block(7 * 512, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 7));

        device.read_block(0, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_read_is_an_error() {
        let temp_file = image(1024);
        let mut device = RawDevice::open_regular(temp_file.path()).unwrap();

        let mut buffer = vec![0u8; 512];
        let err = device.read_block(768, &mut buffer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_unknown_size_has_no_geometry() {
        let temp_file = image(1000);
        let mut device = RawDevice::open_regular(temp_file.path()).unwrap();
        let err = device.geometry().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_empty_file_has_no_media() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut device = RawDevice::open_regular(temp_file.path()).unwrap();
        assert_eq!(device.geometry().unwrap(), Geometry::AMIGA_DD);
        assert!(!device.media_present().unwrap());
    }

    #[test]
    fn test_stop_motor_is_a_no_op_off_floppy() {
        let temp_file = image(512);
        let mut device = RawDevice::open(temp_file.path()).unwrap();
        device.stop_motor().unwrap();
        assert_eq!(device.name(), temp_file.path().file_name().unwrap().to_str().unwrap());
        device.close();
    }

    #[test]
    fn test_missing_node_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawDevice::open(dir.path().join("fd9")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
