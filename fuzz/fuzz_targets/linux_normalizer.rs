#![no_main]

use libfuzzer_sys::fuzz_target;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_detection::LinuxAuthParser;

fuzz_target!(|data: &[u8]| {
    let parser = LinuxAuthParser::new();

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    let _ = parser.normalize(data);
});
