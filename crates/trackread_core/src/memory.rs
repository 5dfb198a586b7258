//! A block device held entirely in RAM.
//!
//! Records every command it receives, and can be told to fail specific
//! operations, so the pipeline and the session teardown can be exercised
//! without a drive.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::device::BlockDevice;
use crate::geometry::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Geometry,
    MediaPresent,
    Read { offset: u64, len: usize },
    StopMotor,
    Close,
}

/// Shared journal of the commands a [`MemoryDevice`] received.
pub type CommandLog = Rc<RefCell<Vec<DeviceCommand>>>;

#[derive(Debug)]
pub struct MemoryDevice {
    name: String,
    geometry: Geometry,
    contents: Vec<u8>,
    media_present: bool,
    failing_read: Option<u64>,
    fail_geometry: bool,
    fail_motor: bool,
    log: CommandLog,
}

impl MemoryDevice {
    /// A zero-filled medium of `geometry.capacity()` bytes.
    pub fn new(geometry: Geometry) -> Self {
        Self::with_contents(geometry, Vec::new())
    }

    /// A medium holding `contents`, padded or truncated to the geometry's capacity.
    pub fn with_contents(geometry: Geometry, mut contents: Vec<u8>) -> Self {
        contents.resize(geometry.capacity() as usize, 0);
        Self {
            name: "mem0".to_string(),
            geometry,
            contents,
            media_present: true,
            failing_read: None,
            fail_geometry: false,
            fail_motor: false,
            log: Rc::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets every byte from its absolute offset.
    pub fn fill_with(mut self, f: impl Fn(u64) -> u8) -> Self {
        for (offset, byte) in self.contents.iter_mut().enumerate() {
            *byte = f(offset as u64);
        }
        self
    }

    pub fn without_media(mut self) -> Self {
        self.media_present = false;
        self
    }

    /// Makes the read at byte `offset` fail with an I/O error.
    pub fn failing_read_at(mut self, offset: u64) -> Self {
        self.failing_read = Some(offset);
        self
    }

    pub fn failing_geometry(mut self) -> Self {
        self.fail_geometry = true;
        self
    }

    pub fn failing_motor(mut self) -> Self {
        self.fail_motor = true;
        self
    }

    pub fn command_log(&self) -> CommandLog {
        Rc::clone(&self.log)
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    fn record(&self, command: DeviceCommand) {
        self.log.borrow_mut().push(command);
    }
}

impl BlockDevice for MemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&mut self) -> io::Result<Geometry> {
        self.record(DeviceCommand::Geometry);
        if self.fail_geometry {
            return Err(io::Error::other("geometry query rejected"));
        }
        Ok(self.geometry)
    }

    fn media_present(&mut self) -> io::Result<bool> {
        self.record(DeviceCommand::MediaPresent);
        Ok(self.media_present)
    }

    fn read_block(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        self.record(DeviceCommand::Read {
            offset,
            len: buffer.len(),
        });

        if self.failing_read == Some(offset) {
            return Err(io::Error::other("simulated media fault"));
        }

        let start = usize::try_from(offset)
            .map_err(|_| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let end = start
            .checked_add(buffer.len())
            .filter(|&end| end <= self.contents.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buffer.copy_from_slice(&self.contents[start..end]);
        Ok(())
    }

    fn stop_motor(&mut self) -> io::Result<()> {
        self.record(DeviceCommand::StopMotor);
        if self.fail_motor {
            return Err(io::Error::other("motor did not respond"));
        }
        Ok(())
    }

    fn close(self) {
        self.record(DeviceCommand::Close);
    }
}
