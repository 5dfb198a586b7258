mod image;
pub mod ioctl;
mod raw;

pub use image::ImageDevice;
pub use raw::{FLOPPY_MAJOR, NodeKind, RawDevice};

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use trackread_core::{BlockDevice, DeviceTarget, FloppyFormat, Geometry};

/// Node of floppy drive `unit`.
pub fn unit_path(unit: u32) -> PathBuf {
    DeviceTarget::Unit(unit).path()
}

/// Picks the known floppy format whose capacity is exactly `len` bytes.
pub fn infer_geometry(len: u64) -> io::Result<Geometry> {
    match FloppyFormat::from_image_size(len) {
        Some(format) => {
            debug!(format = format.name, len, "inferred geometry from size");
            Ok(format.geometry)
        }
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{len} bytes does not match any known floppy format"),
        )),
    }
}

pub enum Device {
    Raw(RawDevice),
    Image(ImageDevice),
}

impl Device {
    pub fn open(target: &DeviceTarget) -> io::Result<Self> {
        match target {
            DeviceTarget::Unit(unit) => Self::open_unit(*unit),
            DeviceTarget::Path(path) => Self::open_path(path),
        }
    }

    pub fn open_unit(unit: u32) -> io::Result<Self> {
        RawDevice::open(unit_path(unit)).map(Device::Raw)
    }

    /// Memory-maps regular files; everything else is opened as a device node.
    pub fn open_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if std::fs::metadata(path)?.is_file() {
            ImageDevice::open(path).map(Device::Image)
        } else {
            RawDevice::open(path).map(Device::Raw)
        }
    }

    #[inline]
    pub fn is_image(&self) -> bool {
        matches!(self, Device::Image(_))
    }
}

impl BlockDevice for Device {
    fn name(&self) -> &str {
        match self {
            Device::Raw(d) => d.name(),
            Device::Image(d) => d.name(),
        }
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        match self {
            Device::Raw(d) => d.geometry(),
            Device::Image(d) => d.geometry(),
        }
    }

    fn media_present(&mut self) -> io::Result<bool> {
        match self {
            Device::Raw(d) => d.media_present(),
            Device::Image(d) => d.media_present(),
        }
    }

    fn read_block(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        match self {
            Device::Raw(d) => d.read_block(offset, buffer),
            Device::Image(d) => d.read_block(offset, buffer),
        }
    }

    fn stop_motor(&mut self) -> io::Result<()> {
        match self {
            Device::Raw(d) => d.stop_motor(),
            Device::Image(d) => d.stop_motor(),
        }
    }

    fn close(self) {
        match self {
            Device::Raw(d) => d.close(),
            Device::Image(d) => d.close(),
        }
    }
}
