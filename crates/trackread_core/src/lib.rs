//! Core of the trackread floppy dumper: region translation, block reading,
//! hexdump rendering and session lifecycle. Platform device access lives in
//! `trackread_io`.

pub mod buffer;
mod device;
mod error;
pub mod geometry;
pub mod hexdump;
pub mod memory;
pub mod reader;
pub mod region;
pub mod session;
pub mod sink;

pub use buffer::SectorBuffer;
pub use device::{BlockDevice, DeviceTarget};
pub use error::{Result, TrackError};
pub use geometry::{FloppyFormat, Geometry, resolve_geometry};
pub use memory::{DeviceCommand, MemoryDevice};
pub use reader::{ProgressFn, ReadSummary, read_region};
pub use region::{AddressMode, Region, RegionRequest};
pub use session::{NUM_UNITS, Resources, Session, SessionConfig};
pub use sink::{BlockSink, FileSink, HexSink, OutputSink};
