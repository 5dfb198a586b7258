//! Block device capability used by the read pipeline.
//!
//! The pipeline never talks to hardware directly. Everything it needs from a
//! drive goes through [`BlockDevice`], so the same code runs against a real
//! floppy unit, a disk image or the in-memory [`crate::MemoryDevice`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::geometry::Geometry;

/// What the operator asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    /// A numbered floppy drive unit.
    Unit(u32),
    /// An explicit device node or disk image.
    Path(PathBuf),
}

impl Default for DeviceTarget {
    fn default() -> Self {
        DeviceTarget::Unit(0)
    }
}

impl DeviceTarget {
    /// Node that gets opened: `/dev/fd<unit>` for a drive unit.
    pub fn path(&self) -> PathBuf {
        match self {
            DeviceTarget::Unit(unit) => PathBuf::from(format!("/dev/fd{unit}")),
            DeviceTarget::Path(path) => path.clone(),
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Synchronous access to a sector-addressed drive.
///
/// Every call blocks until the drive answers. Errors are plain
/// [`io::Error`]s so the OS error description survives up to the operator.
///
/// # Example
///
/// ```ignore
/// let mut device = MemoryDevice::new(Geometry::AMIGA_DD);
/// let geometry = device.geometry()?;
/// let mut sector = vec![0u8; geometry.sector_size as usize];
/// device.read_block(0, &mut sector)?;
/// ```
pub trait BlockDevice {
    /// Short name used in reports and error messages, e.g. `fd0`.
    fn name(&self) -> &str;

    /// Queries the physical layout of the medium.
    fn geometry(&mut self) -> io::Result<Geometry>;

    /// Returns whether a medium is inserted.
    fn media_present(&mut self) -> io::Result<bool>;

    /// Fills `buffer` completely with the bytes stored at `offset`.
    ///
    /// A short read is an error; implementations must never hand back a
    /// partially filled buffer.
    fn read_block(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()>;

    /// Switches the drive motor off. Best effort.
    fn stop_motor(&mut self) -> io::Result<()>;

    /// Releases the handle.
    fn close(self)
    where
        Self: Sized,
    {
    }
}
