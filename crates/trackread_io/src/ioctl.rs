//! Linux block device queries.

use std::fs::File;
use std::io;

#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    const HDIO_GETGEO: libc::c_ulong = 0x0301;
    const BLKSSZGET: libc::c_ulong = 0x1268;
    const BLKGETSIZE64: libc::c_ulong = 0x80081272;
    const FDFLUSH: libc::c_ulong = 0x024b;

    #[repr(C)]
    #[derive(Default)]
    struct HdGeometry {
        heads: libc::c_uchar,
        sectors: libc::c_uchar,
        cylinders: libc::c_ushort,
        #[allow(dead_code)]
        start: libc::c_ulong,
    }

    fn check(result: libc::c_int) -> io::Result<()> {
        if result == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    pub fn chs(file: &File) -> io::Result<(u32, u32, u32)> {
        let mut geo = HdGeometry::default();
        check(unsafe { libc::ioctl(file.as_raw_fd(), HDIO_GETGEO, &mut geo) })?;
        Ok((
            u32::from(geo.cylinders),
            u32::from(geo.heads),
            u32::from(geo.sectors),
        ))
    }

    pub fn logical_sector_size(file: &File) -> io::Result<u32> {
        let mut size: libc::c_int = 0;
        check(unsafe { libc::ioctl(file.as_raw_fd(), BLKSSZGET, &mut size) })?;
        u32::try_from(size).map_err(|_| io::Error::from(io::ErrorKind::InvalidData))
    }

    pub fn size_in_bytes(file: &File) -> io::Result<u64> {
        let mut size: u64 = 0;
        check(unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64, &mut size) })?;
        Ok(size)
    }

    pub fn flush_floppy(file: &File) -> io::Result<()> {
        check(unsafe { libc::ioctl(file.as_raw_fd(), FDFLUSH) })
    }

    pub fn is_no_medium(err: &io::Error) -> bool {
        matches!(err.raw_os_error(), Some(libc::ENOMEDIUM) | Some(libc::ENXIO))
    }

    pub fn is_not_a_block_device(err: &io::Error) -> bool {
        matches!(err.raw_os_error(), Some(libc::ENOTTY) | Some(libc::EINVAL))
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use std::fs::File;
    use std::io;

    fn unsupported<T>() -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Not supported on this platform",
        ))
    }

    pub fn chs(_file: &File) -> io::Result<(u32, u32, u32)> {
        unsupported()
    }

    pub fn logical_sector_size(_file: &File) -> io::Result<u32> {
        unsupported()
    }

    pub fn size_in_bytes(_file: &File) -> io::Result<u64> {
        unsupported()
    }

    pub fn flush_floppy(_file: &File) -> io::Result<()> {
        unsupported()
    }

    pub fn is_no_medium(_err: &io::Error) -> bool {
        false
    }

    pub fn is_not_a_block_device(err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::Unsupported
    }
}

/// Cylinders, heads and sectors per track as reported by the driver.
pub fn chs(file: &File) -> io::Result<(u32, u32, u32)> {
    sys::chs(file)
}

pub fn logical_sector_size(file: &File) -> io::Result<u32> {
    sys::logical_sector_size(file)
}

pub fn size_in_bytes(file: &File) -> io::Result<u64> {
    sys::size_in_bytes(file)
}

/// Invalidates the floppy driver's cache; the motor spins down once idle.
pub fn flush_floppy(file: &File) -> io::Result<()> {
    sys::flush_floppy(file)
}

/// Whether `err` means the drive holds no disk.
pub fn is_no_medium(err: &io::Error) -> bool {
    sys::is_no_medium(err)
}


/// Whether `err` means the query does not apply to this kind of file.
pub fn is_not_a_block_device(err: &io::Error) -> bool {
    sys::is_not_a_block_device(err)
}
