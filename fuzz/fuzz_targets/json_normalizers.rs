#![no_main]

use libfuzzer_sys::fuzz_target;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_detection::{CloudTrailParser, RecordParser, WindowsEventParser};

fuzz_target!(|data: &[u8]| {
    let _ = WindowsEventParser::new().normalize(data);
    let _ = CloudTrailParser::new().normalize(data);
    let _ = RecordParser::new().normalize(data);
});
