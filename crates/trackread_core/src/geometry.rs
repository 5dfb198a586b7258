//! Drive geometry and the geometry query.

use std::fmt::Write as _;
use tracing::debug;

use crate::device::BlockDevice;
use crate::error::{Result, TrackError};

/// Physical layout of a medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Bytes per sector.
    pub sector_size: u32,
    /// Sectors on the whole medium.
    pub total_sectors: u64,
    pub cylinders: u32,
    pub heads: u32,
    pub sectors_per_track: u32,
}

impl Geometry {
    /// Amiga double density, 880 KiB.
    pub const AMIGA_DD: Geometry = Geometry::new(512, 80, 2, 11);
    /// Amiga high density, 1760 KiB.
    pub const AMIGA_HD: Geometry = Geometry::new(512, 80, 2, 22);
    pub const PC_720K: Geometry = Geometry::new(512, 80, 2, 9);
    pub const PC_1200K: Geometry = Geometry::new(512, 80, 2, 15);
    pub const PC_1440K: Geometry = Geometry::new(512, 80, 2, 18);
    pub const PC_2880K: Geometry = Geometry::new(512, 80, 2, 36);

    /// Builds a geometry whose total sector count is `cylinders * heads * sectors_per_track`.
    pub const fn new(sector_size: u32, cylinders: u32, heads: u32, sectors_per_track: u32) -> Self {
        Self {
            sector_size,
            total_sectors: cylinders as u64 * heads as u64 * sectors_per_track as u64,
            cylinders,
            heads,
            sectors_per_track,
        }
    }

    /// Overrides the total sector count, for drives that report it separately.
    pub const fn with_total_sectors(mut self, total_sectors: u64) -> Self {
        self.total_sectors = total_sectors;
        self
    }

    #[inline]
    pub const fn cylinder_sectors(&self) -> u64 {
        self.heads as u64 * self.sectors_per_track as u64
    }

    #[inline]
    pub const fn track_count(&self) -> u64 {
        self.cylinders as u64 * self.heads as u64
    }

    #[inline]
    pub const fn track_size(&self) -> u64 {
        self.sector_size as u64 * self.sectors_per_track as u64
    }

    #[inline]
    pub const fn capacity(&self) -> u64 {
        self.total_sectors * self.sector_size as u64
    }

    /// Renders the verbose geometry report for `device`.
    pub fn report(&self, device: &str) -> String {
        let title = format!("{device} geometry");
        let mut out = String::new();
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.len()));
        let _ = writeln!(out, "  Sector size:      {}", self.sector_size);
        let _ = writeln!(out, "  Total sectors:    {}", self.total_sectors);
        let _ = writeln!(out, "  Cylinders:        {}", self.cylinders);
        let _ = writeln!(out, "  Sectors/cylinder: {}", self.cylinder_sectors());
        let _ = writeln!(out, "  Heads:            {}", self.heads);
        let _ = writeln!(out, "  Sectors/track:    {}", self.sectors_per_track);
        out
    }
}

/// A well-known floppy format, recognised by the size of its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloppyFormat {
    pub name: &'static str,
    pub geometry: Geometry,
}

pub const KNOWN_FORMATS: &[FloppyFormat] = &[
    FloppyFormat {
        name: "Amiga DD",
        geometry: Geometry::AMIGA_DD,
    },
    FloppyFormat {
        name: "Amiga HD",
        geometry: Geometry::AMIGA_HD,
    },
    FloppyFormat {
        name: "PC 720K",
        geometry: Geometry::PC_720K,
    },
    FloppyFormat {
        name: "PC 1.2M",
        geometry: Geometry::PC_1200K,
    },
    FloppyFormat {
        name: "PC 1.44M",
        geometry: Geometry::PC_1440K,
    },
    FloppyFormat {
        name: "PC 2.88M",
        geometry: Geometry::PC_2880K,
    },
];

impl FloppyFormat {
    /// Looks up the format whose capacity is exactly `len` bytes.
    pub fn from_image_size(len: u64) -> Option<&'static FloppyFormat> {
        KNOWN_FORMATS.iter().find(|f| f.geometry.capacity() == len)
    }
}

/// Issues the geometry query and checks the answer can drive the translator.
pub fn resolve_geometry<D: BlockDevice + ?Sized>(device: &mut D) -> Result<Geometry> {
    let geometry = device
        .geometry()
        .map_err(|source| TrackError::DeviceQuery {
            device: device.name().to_string(),
            query: "drive geometry",
            source,
        })?;

    if geometry.sector_size == 0 || geometry.sectors_per_track == 0 {
        return Err(TrackError::DeviceQuery {
            device: device.name().to_string(),
            query: "drive geometry",
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "drive reports {} byte sectors and {} sectors per track",
                    geometry.sector_size, geometry.sectors_per_track
                ),
            ),
        });
    }

    debug!(
        device = device.name(),
        sector_size = geometry.sector_size,
        sectors_per_track = geometry.sectors_per_track,
        total_sectors = geometry.total_sectors,
        "resolved geometry"
    );
    Ok(geometry)
}
