use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::region::AddressMode;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Unable to open {device}")]
    DeviceOpen {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("Unable to get {query} of {device}")]
    DeviceQuery {
        device: String,
        query: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("No disk present in {device}")]
    NoMedia { device: String },

    #[error(
        "Impossible to read {mode} {first}..{last} on a {total} {mode} drive (0..{max})",
        max = .total.saturating_sub(1)
    )]
    OutOfRange {
        mode: AddressMode,
        first: u64,
        last: u64,
        total: u64,
    },

    #[error("Unable to allocate a {size} byte sector buffer")]
    Allocation { size: usize },

    #[error("Error while reading sector {sector} (block {block} of the region)")]
    Read {
        block: u64,
        sector: u64,
        #[source]
        source: io::Error,
    },

    #[error("Error while writing block {block} to the output")]
    Write {
        block: u64,
        #[source]
        source: io::Error,
    },

    #[error("Unable to create file {}", .path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Empty block handed to the hex renderer")]
    Input,

    #[error("Device already released")]
    Released,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;
