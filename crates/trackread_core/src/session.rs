//! One dump run: configuration, resource ownership and the pipeline.
//!
//! [`Session::open_with_console`] acquires the output file and the device,
//! fetches the geometry and validates the request. [`Session::run`] then
//! streams the region into the active sink. Whatever happens, the device and
//! the file are released by [`Resources`], either explicitly or on drop.

use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::device::{BlockDevice, DeviceTarget};
use crate::error::{Result, TrackError};
use crate::geometry::{Geometry, resolve_geometry};
use crate::reader::{ProgressFn, ReadSummary, read_region};
use crate::region::{self, Region, RegionRequest};
use crate::sink::{FileSink, HexSink, OutputSink};

/// Number of floppy units a host can address.
pub const NUM_UNITS: u32 = 4;

/// Everything the operator chose for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub request: RegionRequest,
    pub target: DeviceTarget,
    /// Raw binary output file; `None` renders a hexdump on the console.
    pub output: Option<PathBuf>,
    /// Print the geometry report before reading.
    pub verbose: bool,
}

impl SessionConfig {
    pub fn new(request: RegionRequest) -> Self {
        Self {
            request,
            ..Default::default()
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.request.count = count;
        self
    }

    pub fn with_unit(mut self, unit: u32) -> Self {
        self.target = DeviceTarget::Unit(unit);
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = DeviceTarget::Path(path.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.request.count == 0 {
            return Err(TrackError::Argument(format!(
                "Bad count: {}",
                self.request.count
            )));
        }
        if let DeviceTarget::Unit(unit) = self.target {
            if unit >= NUM_UNITS {
                return Err(TrackError::Argument(format!("Bad floppy unit: {unit}")));
            }
        }
        Ok(())
    }
}

/// The handles a session owns.
///
/// Release stops the motor of an opened device (failures are only logged),
/// closes the device, then closes the output file. Each step runs at most
/// once; releasing again is a no-op.
pub struct Resources<D: BlockDevice> {
    device: Option<D>,
    output: Option<File>,
}

impl<D: BlockDevice> Default for Resources<D> {
    fn default() -> Self {
        Self {
            device: None,
            output: None,
        }
    }
}

impl<D: BlockDevice> Resources<D> {
    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.device.as_mut()
    }

    pub fn is_released(&self) -> bool {
        self.device.is_none() && self.output.is_none()
    }

    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            let name = device.name().to_string();
            if let Err(err) = device.stop_motor() {
                warn!(device = %name, error = %err, "unable to stop the drive motor");
            }
            device.close();
            debug!(device = %name, "device closed");
        }

        if let Some(file) = self.output.take() {
            drop(file);
            debug!("output file closed");
        }
    }
}

impl<D: BlockDevice> Drop for Resources<D> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Session<D: BlockDevice, C: Write = Stdout> {
    config: SessionConfig,
    resources: Resources<D>,
    console: C,
    geometry: Geometry,
    region: Region,
}

impl<D: BlockDevice> Session<D, Stdout> {
    /// Opens a session that renders hexdumps and reports on stdout.
    pub fn open<F>(config: SessionConfig, open_device: F) -> Result<Self>
    where
        F: FnOnce(&DeviceTarget) -> io::Result<D>,
    {
        Self::open_with_console(config, io::stdout(), open_device)
    }
}

impl<D: BlockDevice, C: Write> Session<D, C> {
    /// Acquires every resource and validates the request.
    ///
    /// On error, whatever was already acquired is released before returning.
    pub fn open_with_console<F>(
        config: SessionConfig,
        mut console: C,
        open_device: F,
    ) -> Result<Self>
    where
        F: FnOnce(&DeviceTarget) -> io::Result<D>,
    {
        config.validate()?;
        let mut resources = Resources::default();

        if let Some(path) = &config.output {
            let file = File::create(path).map_err(|source| TrackError::OutputOpen {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "output file created");
            resources.output = Some(file);
        }

        let device = open_device(&config.target).map_err(|source| TrackError::DeviceOpen {
            device: config.target.to_string(),
            source,
        })?;
        let device = resources.device.insert(device);
        debug!(device = device.name(), target = %config.target, "device opened");

        let geometry = resolve_geometry(device)?;
        if config.verbose {
            console.write_all(geometry.report(device.name()).as_bytes())?;
        }

        let region = region::validate(device, &config.request, &geometry)?;

        Ok(Self {
            config,
            resources,
            console,
            geometry,
            region,
        })
    }

    /// Reads the validated region into the output chosen at open time.
    pub fn run(&mut self, progress: Option<ProgressFn<'_>>) -> Result<ReadSummary> {
        let Resources { device, output } = &mut self.resources;
        let device = device.as_mut().ok_or(TrackError::Released)?;

        let mut sink = match output.as_mut() {
            Some(file) => OutputSink::File(FileSink::new(file)),
            None => OutputSink::Console(HexSink::new(&mut self.console)),
        };

        let summary = read_region(device, &self.region, &mut sink, progress)?;
        info!(
            device = device.name(),
            blocks = summary.blocks,
            bytes = summary.bytes,
            "read complete"
        );
        Ok(summary)
    }

    /// Releases the device and the output file. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.resources.release();
    }

    pub fn close(mut self) {
        self.release();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn is_released(&self) -> bool {
        self.resources.is_released()
    }
}
