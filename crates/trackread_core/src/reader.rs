use tracing::debug;

use crate::buffer::SectorBuffer;
use crate::device::BlockDevice;
use crate::error::{Result, TrackError};
use crate::region::Region;
use crate::sink::BlockSink;

/// Progress callback: `(blocks_done, blocks_total)`.
pub type ProgressFn<'a> = &'a dyn Fn(u64, u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub blocks: u64,
    pub bytes: u64,
}

/// Reads every block of `region` in order and hands each one to `sink`.
///
/// One sector buffer is allocated up front and reused for every block. The
/// first failing read or sink call aborts the loop; blocks already delivered
/// stay delivered and nothing is retried.
pub fn read_region<D, S>(
    device: &mut D,
    region: &Region,
    sink: &mut S,
    progress: Option<ProgressFn<'_>>,
) -> Result<ReadSummary>
where
    D: BlockDevice + ?Sized,
    S: BlockSink + ?Sized,
{
    let sector_size = region.sector_size as usize;
    let mut buffer = SectorBuffer::try_new(sector_size)?;
    let mut summary = ReadSummary::default();

    debug!(
        device = device.name(),
        offset = region.offset,
        blocks = region.block_count,
        sector_size,
        "reading region"
    );

    for block in 0..region.block_count {
        let offset = region.block_offset(block);

        device
            .read_block(offset, &mut buffer)
            .map_err(|source| TrackError::Read {
                block,
                sector: offset / u64::from(region.sector_size),
                source,
            })?;

        sink.write_block(block, &buffer)?;

        summary.blocks += 1;
        summary.bytes += sector_size as u64;
        if let Some(report) = progress {
            report(summary.blocks, region.block_count);
        }
    }

    sink.finish()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::memory::{DeviceCommand, MemoryDevice};
    use crate::region::RegionRequest;
    use std::cell::Cell;

    #[derive(Default)]
    struct Collect {
        blocks: Vec<(u64, Vec<u8>)>,
        finished: bool,
    }

    impl BlockSink for Collect {
        fn write_block(&mut self, index: u64, block: &[u8]) -> Result<()> {
            self.blocks.push((index, block.to_vec()));
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn numbered_device() -> MemoryDevice {
        MemoryDevice::new(Geometry::AMIGA_DD).fill_with(|offset| (offset / 512) as u8)
    }

    #[test]
    fn test_reads_each_block_once_in_order() {
        let mut device = numbered_device();
        let log = device.command_log();
        let region = Region::translate(&RegionRequest::sectors(4, 3), &Geometry::AMIGA_DD).unwrap();
        let mut sink = Collect::default();

        let summary = read_region(&mut device, &region, &mut sink, None).unwrap();

        assert_eq!(summary, ReadSummary { blocks: 3, bytes: 1536 });
        assert!(sink.finished);
        let indices: Vec<u64> = sink.blocks.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert!(sink.blocks[0].1.iter().all(|&b| b == 4));
        assert!(sink.blocks[2].1.iter().all(|&b| b == 6));

        let reads: Vec<DeviceCommand> = log.borrow().clone();
        assert_eq!(
            reads,
            [
                DeviceCommand::Read { offset: 2048, len: 512 },
                DeviceCommand::Read { offset: 2560, len: 512 },
                DeviceCommand::Read { offset: 3072, len: 512 },
            ]
        );
    }

    #[test]
    fn test_read_failure_stops_after_k_blocks() {
        let mut device = numbered_device().failing_read_at(2 * 512);
        let log = device.command_log();
        let region = Region::translate(&RegionRequest::sectors(0, 5), &Geometry::AMIGA_DD).unwrap();
        let mut sink = Collect::default();

        let err = read_region(&mut device, &region, &mut sink, None).unwrap_err();

        assert!(matches!(err, TrackError::Read { block: 2, sector: 2, .. }));
        assert_eq!(sink.blocks.len(), 2);
        assert!(!sink.finished);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_progress_reports_every_block() {
        let mut device = numbered_device();
        let region = Region::translate(&RegionRequest::tracks(1, 1), &Geometry::AMIGA_DD).unwrap();
        let calls = Cell::new(0u64);
        let last = Cell::new((0u64, 0u64));
        let progress = |done: u64, total: u64| {
            calls.set(calls.get() + 1);
            last.set((done, total));
        };

        read_region(&mut device, &region, &mut Collect::default(), Some(&progress)).unwrap();

        assert_eq!(calls.get(), 11);
        assert_eq!(last.get(), (11, 11));
    }

    #[test]
    fn test_sink_failure_aborts_reading() {
        struct FailSecond;
        impl BlockSink for FailSecond {
            fn write_block(&mut self, index: u64, _block: &[u8]) -> Result<()> {
                if index == 1 {
                    Err(TrackError::Write {
                        block: index,
                        source: std::io::Error::other("disk full"),
                    })
                } else {
                    Ok(())
                }
            }
        }

        let mut device = numbered_device();
        let log = device.command_log();
        let region = Region::translate(&RegionRequest::sectors(0, 4), &Geometry::AMIGA_DD).unwrap();

        let err = read_region(&mut device, &region, &mut FailSecond, None).unwrap_err();

        assert!(matches!(err, TrackError::Write { block: 1, .. }));
        assert_eq!(log.borrow().len(), 2);
    }
}
