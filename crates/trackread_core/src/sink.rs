//! Where the block reader delivers each block.

use std::io::Write;

use crate::error::{Result, TrackError};
use crate::hexdump;

/// Receives blocks in ascending offset order.
///
/// An error aborts the read loop immediately; no further blocks are read.
pub trait BlockSink {
    /// Consumes block `index` of the region.
    fn write_block(&mut self, index: u64, block: &[u8]) -> Result<()>;

    /// Called once after the last block was delivered.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Appends raw block bytes to a writer, with no framing.
#[derive(Debug)]
pub struct FileSink<W> {
    out: W,
    blocks: u64,
    bytes: u64,
}

impl<W: Write> FileSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            blocks: 0,
            bytes: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BlockSink for FileSink<W> {
    fn write_block(&mut self, index: u64, block: &[u8]) -> Result<()> {
        self.out
            .write_all(block)
            .map_err(|source| TrackError::Write {
                block: index,
                source,
            })?;
        self.blocks += 1;
        self.bytes += block.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(|source| TrackError::Write {
            block: self.blocks.saturating_sub(1),
            source,
        })
    }
}

/// Renders every block as a hexdump on a console-like writer.
#[derive(Debug)]
pub struct HexSink<W> {
    out: W,
    line: String,
    last_block: u64,
}

impl<W: Write> HexSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: String::new(),
            last_block: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BlockSink for HexSink<W> {
    fn write_block(&mut self, index: u64, block: &[u8]) -> Result<()> {
        if block.is_empty() {
            return Err(TrackError::Input);
        }

        self.line.clear();
        let _ = hexdump::write_hexdump(&mut self.line, block);
        self.out
            .write_all(self.line.as_bytes())
            .map_err(|source| TrackError::Write {
                block: index,
                source,
            })?;
        self.last_block = index;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(|source| TrackError::Write {
            block: self.last_block,
            source,
        })
    }
}

/// The two output variants. Exactly one is active for a session.
pub enum OutputSink<'a, C: Write> {
    File(FileSink<&'a mut std::fs::File>),
    Console(HexSink<&'a mut C>),
}

impl<C: Write> BlockSink for OutputSink<'_, C> {
    fn write_block(&mut self, index: u64, block: &[u8]) -> Result<()> {
        match self {
            OutputSink::File(s) => s.write_block(index, block),
            OutputSink::Console(s) => s.write_block(index, block),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self {
            OutputSink::File(s) => s.finish(),
            OutputSink::Console(s) => s.finish(),
        }
    }
}
