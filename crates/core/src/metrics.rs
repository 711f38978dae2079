//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않은 경우 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `threatlens_`
//! - 모듈명: `detection_`, `normalizer_`, `advisory_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(threatlens_core::metrics::DETECTION_ENTRIES_ANALYZED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (info, low, medium, high)
pub const LABEL_SEVERITY: &str = "severity";

/// 카테고리 레이블 키
pub const LABEL_CATEGORY: &str = "category";

/// 로그 소스 레이블 키 (host_auth, windows, cloud_audit)
pub const LABEL_SOURCE: &str = "source";

/// 정규화 형식 레이블 키 (linux, windows, cloudtrail, records)
pub const LABEL_FORMAT: &str = "format";

// ─── Detection 메트릭 ──────────────────────────────────────────────

/// Detection: 평가된 엔트리 수 (counter, label: source)
pub const DETECTION_ENTRIES_ANALYZED_TOTAL: &str = "threatlens_detection_entries_analyzed_total";

/// Detection: 규칙 매칭으로 생성된 원시 탐지 수 (counter, label: severity, category)
pub const DETECTION_RAW_FINDINGS_TOTAL: &str = "threatlens_detection_raw_findings_total";

/// Detection: 집계 후 남은 탐지 수 (counter)
pub const DETECTION_AGGREGATED_FINDINGS_TOTAL: &str =
    "threatlens_detection_aggregated_findings_total";

/// Detection: 상한 초과로 초기화된 탐지 상태 횟수 (counter)
pub const DETECTION_STATE_RESETS_TOTAL: &str = "threatlens_detection_state_resets_total";

// ─── Normalizer 메트릭 ─────────────────────────────────────────────

/// Normalizer: 정규화된 엔트리 수 (counter, label: format)
pub const NORMALIZER_ENTRIES_TOTAL: &str = "threatlens_normalizer_entries_total";

/// Normalizer: 해석하지 못해 건너뛴 레코드 수 (counter, label: format)
pub const NORMALIZER_SKIPPED_TOTAL: &str = "threatlens_normalizer_skipped_total";

// ─── Advisory 메트릭 ───────────────────────────────────────────────

/// Advisory: fallback 응답으로 대체된 횟수 (counter)
pub const ADVISORY_FALLBACK_TOTAL: &str = "threatlens_advisory_fallback_total";

/// 정의된 모든 메트릭 이름
pub const ALL_METRIC_NAMES: [&str; 7] = [
    DETECTION_ENTRIES_ANALYZED_TOTAL,
    DETECTION_RAW_FINDINGS_TOTAL,
    DETECTION_AGGREGATED_FINDINGS_TOTAL,
    DETECTION_STATE_RESETS_TOTAL,
    NORMALIZER_ENTRIES_TOTAL,
    NORMALIZER_SKIPPED_TOTAL,
    ADVISORY_FALLBACK_TOTAL,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// CLI 시작 시 한 번 호출됩니다. 전역 레코더가 없으면 아무 효과가 없습니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        DETECTION_ENTRIES_ANALYZED_TOTAL,
        "Total number of normalized log entries evaluated by the detection engine"
    );
    describe_counter!(
        DETECTION_RAW_FINDINGS_TOTAL,
        "Total number of raw findings produced by rule matches"
    );
    describe_counter!(
        DETECTION_AGGREGATED_FINDINGS_TOTAL,
        "Total number of findings surviving per-batch aggregation"
    );
    describe_counter!(
        DETECTION_STATE_RESETS_TOTAL,
        "Number of times the detection state was cleared after exceeding its bound"
    );
    describe_counter!(
        NORMALIZER_ENTRIES_TOTAL,
        "Total number of log entries produced by normalizers"
    );
    describe_counter!(
        NORMALIZER_SKIPPED_TOTAL,
        "Total number of raw records skipped by normalizers"
    );
    describe_counter!(
        ADVISORY_FALLBACK_TOTAL,
        "Number of advisory requests answered with the fixed fallback"
    );
}
