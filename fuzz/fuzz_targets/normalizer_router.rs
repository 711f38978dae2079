#![no_main]

use libfuzzer_sys::fuzz_target;
use threatlens_detection::{NormalizerRouter, TechniqueMapper, analyze_batch};

fuzz_target!(|data: &[u8]| {
    let router = NormalizerRouter::with_defaults();

    // 정규화에 성공한 입력은 분석까지 통과해야 한다
    if let Ok(entries) = router.normalize(data) {
        let _ = analyze_batch(&entries, &TechniqueMapper::new());
    }
});
