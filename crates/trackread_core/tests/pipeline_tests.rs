use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;
use trackread_core::{
    DeviceCommand, Geometry, MemoryDevice, RegionRequest, Session, SessionConfig, TrackError,
};

#[fixture]
fn patterned() -> MemoryDevice {
    MemoryDevice::new(Geometry::AMIGA_DD)
        .named("df0")
        .fill_with(|offset| (offset.wrapping_mul(31) ^ (offset >> 9)) as u8)
}

#[fixture]
fn scratch() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[rstest]
#[case::single_sector(RegionRequest::sectors(0, 1), 0, 512)]
#[case::sector_run(RegionRequest::sectors(100, 7), 100 * 512, 7 * 512)]
#[case::last_sector(RegionRequest::sectors(1759, 1), 1759 * 512, 512)]
#[case::one_track(RegionRequest::tracks(3, 1), 3 * 5632, 5632)]
#[case::whole_disk(RegionRequest::tracks(0, 160), 0, 901_120)]
fn test_file_output_matches_direct_read(
    patterned: MemoryDevice,
    scratch: TempDir,
    #[case] request: RegionRequest,
    #[case] start: usize,
    #[case] len: usize,
) {
    let expected = patterned.contents()[start..start + len].to_vec();
    let path = scratch.path().join("dump.bin");

    let mut session = Session::open_with_console(
        SessionConfig::new(request).with_output(&path),
        Vec::new(),
        |_| Ok(patterned),
    )
    .unwrap();
    let summary = session.run(None).unwrap();
    let console = session.console().clone();
    session.close();

    assert_eq!(summary.bytes, len as u64);
    assert!(console.is_empty());
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[rstest]
fn test_console_output_is_one_hexdump_per_block(patterned: MemoryDevice) {
    let mut session = Session::open_with_console(
        SessionConfig::new(RegionRequest::sectors(2, 3)),
        Vec::new(),
        |_| Ok(patterned),
    )
    .unwrap();
    session.run(None).unwrap();

    let text = String::from_utf8(session.console().clone()).unwrap();
    assert_eq!(text.lines().count(), 3 * 32);
    assert_eq!(text.matches("0000  ").count(), 3);
    assert_eq!(text.matches("\n01f0: ").count(), 3);
}

#[rstest]
#[case::sectors(RegionRequest::sectors(1758, 3))]
#[case::tracks(RegionRequest::tracks(159, 2))]
#[case::far_away(RegionRequest::sectors(u32::MAX, u32::MAX))]
fn test_out_of_range_never_reads(patterned: MemoryDevice, #[case] request: RegionRequest) {
    let log = patterned.command_log();
    let result = Session::open_with_console(SessionConfig::new(request), Vec::new(), |_| {
        Ok(patterned)
    });

    assert!(matches!(result, Err(TrackError::OutOfRange { .. })));
    assert!(
        log.borrow()
            .iter()
            .all(|c| !matches!(c, DeviceCommand::Read { .. } | DeviceCommand::MediaPresent))
    );
    assert_eq!(log.borrow().last(), Some(&DeviceCommand::Close));
}

#[rstest]
fn test_read_failure_keeps_delivered_blocks(patterned: MemoryDevice, scratch: TempDir) {
    let expected = patterned.contents()[..4 * 512].to_vec();
    let device = patterned.failing_read_at(4 * 512);
    let log = device.command_log();
    let path = scratch.path().join("partial.bin");

    let mut session = Session::open_with_console(
        SessionConfig::new(RegionRequest::sectors(0, 10)).with_output(&path),
        Vec::new(),
        |_| Ok(device),
    )
    .unwrap();
    let err = session.run(None).unwrap_err();
    drop(session);

    assert!(matches!(err, TrackError::Read { block: 4, sector: 4, .. }));
    let reads = log
        .borrow()
        .iter()
        .filter(|c| matches!(c, DeviceCommand::Read { .. }))
        .count();
    assert_eq!(reads, 5);
    assert_eq!(fs::read(&path).unwrap(), expected);
    assert_eq!(log.borrow().last(), Some(&DeviceCommand::Close));
}

#[rstest]
fn test_output_is_created_before_the_device_is_opened(scratch: TempDir) {
    let path = scratch.path().join("never.bin");
    let result: Result<Session<MemoryDevice, Vec<u8>>, _> = Session::open_with_console(
        SessionConfig::new(RegionRequest::sectors(0, 1)).with_output(&path),
        Vec::new(),
        |_| Err(std::io::Error::from(std::io::ErrorKind::NotFound)),
    );

    assert!(matches!(result, Err(TrackError::DeviceOpen { .. })));
    assert!(path.exists());
}

#[rstest]
fn test_unwritable_output_is_reported(patterned: MemoryDevice, scratch: TempDir) {
    let log = patterned.command_log();
    let path = scratch.path().join("missing").join("dump.bin");

    let result = Session::open_with_console(
        SessionConfig::new(RegionRequest::sectors(0, 1)).with_output(&path),
        Vec::new(),
        |_| Ok(patterned),
    );

    assert!(matches!(result, Err(TrackError::OutputOpen { .. })));
    assert!(log.borrow().is_empty());
}

#[rstest]
fn test_missing_disk_is_reported_after_bounds(patterned: MemoryDevice) {
    let device = patterned.without_media();
    let result = Session::open_with_console(
        SessionConfig::new(RegionRequest::tracks(0, 1)),
        Vec::new(),
        |_| Ok(device),
    );
    match result {
        Err(err @ TrackError::NoMedia { .. }) => {
            assert_eq!(err.to_string(), "No disk present in df0")
        }
        _ => panic!("expected NoMedia"),
    }
}

#[rstest]
fn test_verbose_report_names_the_device(patterned: MemoryDevice) {
    let session = Session::open_with_console(
        SessionConfig::new(RegionRequest::sectors(0, 1)).verbose(true),
        Vec::new(),
        |_| Ok(patterned),
    )
    .unwrap();

    let text = String::from_utf8(session.console().clone()).unwrap();
    assert_eq!(
        text,
        Geometry::AMIGA_DD.report("df0"),
        "the report is written at open time, before any block"
    );
}
