#![no_main]

use libfuzzer_sys::fuzz_target;
use trackread_core::{Geometry, MemoryDevice, RegionRequest, region};

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let first = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let request = if data[8] & 1 == 0 {
        RegionRequest::tracks(first, count)
    } else {
        RegionRequest::sectors(first, count)
    };
    let geometry = match data[9] % 3 {
        0 => Geometry::AMIGA_DD,
        1 => Geometry::PC_1440K,
        _ => Geometry::new(4096, 1, 1, 1),
    };

    let mut device = MemoryDevice::new(geometry);
    if let Ok(plan) = region::validate(&mut device, &request, &geometry) {
        assert!(plan.offset + plan.byte_len() <= geometry.capacity());
    }
});
