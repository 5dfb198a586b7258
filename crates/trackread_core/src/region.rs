//! Turning a track or sector request into a linear read plan.

use std::fmt;
use tracing::debug;

use crate::device::BlockDevice;
use crate::error::{Result, TrackError};
use crate::geometry::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Track,
    Sector,
}

impl AddressMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressMode::Track => "tracks",
            AddressMode::Sector => "sectors",
        }
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the operator asked for: `count` tracks or sectors starting at `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRequest {
    pub mode: AddressMode,
    pub first: u32,
    pub count: u32,
}

impl RegionRequest {
    pub const fn tracks(first: u32, count: u32) -> Self {
        Self {
            mode: AddressMode::Track,
            first,
            count,
        }
    }

    pub const fn sectors(first: u32, count: u32) -> Self {
        Self {
            mode: AddressMode::Sector,
            first,
            count,
        }
    }

    /// Inclusive index of the last addressed track or sector.
    #[inline]
    pub fn last(&self) -> u64 {
        (u64::from(self.first) + u64::from(self.count)).saturating_sub(1)
    }
}

impl Default for RegionRequest {
    fn default() -> Self {
        Self::sectors(0, 1)
    }
}

/// Linear read plan in device sector units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Byte offset of the first block.
    pub offset: u64,
    pub sector_size: u32,
    pub block_count: u64,
}

impl Region {
    /// Converts a request into a byte offset and a block count.
    ///
    /// Returns `None` when the region does not fit a 64-bit byte range.
    pub fn translate(request: &RegionRequest, geometry: &Geometry) -> Option<Self> {
        let sector_size = u64::from(geometry.sector_size);
        let first = u64::from(request.first);
        let count = u64::from(request.count);

        let (offset, block_count) = match request.mode {
            AddressMode::Sector => (sector_size.checked_mul(first)?, count),
            AddressMode::Track => {
                let spt = u64::from(geometry.sectors_per_track);
                let track_size = sector_size.checked_mul(spt)?;
                (track_size.checked_mul(first)?, count.checked_mul(spt)?)
            }
        };

        block_count
            .checked_mul(sector_size)
            .and_then(|len| offset.checked_add(len))?;

        Some(Self {
            offset,
            sector_size: geometry.sector_size,
            block_count,
        })
    }

    /// Byte offset of block `index` of the region.
    #[inline]
    pub fn block_offset(&self, index: u64) -> u64 {
        self.offset + index * u64::from(self.sector_size)
    }

    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.block_count * u64::from(self.sector_size)
    }

    /// Absolute index of the first sector.
    #[inline]
    pub fn first_sector(&self) -> u64 {
        self.offset / u64::from(self.sector_size.max(1))
    }
}

/// Rejects requests that address past the last track or sector of the medium.
///
/// The bound is inclusive: `first + count - 1` must itself be a valid index.
pub fn check_bounds(request: &RegionRequest, geometry: &Geometry) -> Result<()> {
    if request.count == 0 {
        return Err(TrackError::Argument(format!("Bad count: {}", request.count)));
    }

    let total = match request.mode {
        AddressMode::Sector => geometry.total_sectors,
        AddressMode::Track => geometry.track_count(),
    };
    let last = request.last();

    if last >= total {
        return Err(TrackError::OutOfRange {
            mode: request.mode,
            first: u64::from(request.first),
            last,
            total,
        });
    }
    Ok(())
}

/// Checks the request against the geometry and the drive, then returns the read plan.
///
/// Bounds are checked before the media query, so an impossible request never
/// touches the drive beyond the geometry round-trip that produced `geometry`.
pub fn validate<D: BlockDevice + ?Sized>(
    device: &mut D,
    request: &RegionRequest,
    geometry: &Geometry,
) -> Result<Region> {
    check_bounds(request, geometry)?;

    let region = Region::translate(request, geometry).ok_or(TrackError::OutOfRange {
        mode: request.mode,
        first: u64::from(request.first),
        last: request.last(),
        total: match request.mode {
            AddressMode::Sector => geometry.total_sectors,
            AddressMode::Track => geometry.track_count(),
        },
    })?;

    let present = device
        .media_present()
        .map_err(|source| TrackError::DeviceQuery {
            device: device.name().to_string(),
            query: "disk presence",
            source,
        })?;
    if !present {
        return Err(TrackError::NoMedia {
            device: device.name().to_string(),
        });
    }

    debug!(
        offset = region.offset,
        blocks = region.block_count,
        "validated {} {}..{}",
        request.mode,
        request.first,
        request.last()
    );
    Ok(region)
}
