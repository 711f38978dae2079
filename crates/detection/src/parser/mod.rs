//! 로그 정규화 모듈 -- 원시 입력을 [`LogEntry`]로 변환
//!
//! [`NormalizerRouter`]는 입력 형식을 판별하여 적절한 정규화기를 선택합니다.
//! 각 정규화기는 core의 [`LogNormalizer`] trait을 구현합니다.
//!
//! # 지원 형식
//! - Linux auth.log ([`LinuxAuthParser`])
//! - Windows 보안 이벤트 JSONL ([`WindowsEventParser`])
//! - CloudTrail `Records` 문서 ([`CloudTrailParser`])
//! - 소스 태그 없는 레코드 배열 / JSONL ([`RecordParser`])
//!
//! 해석할 수 없는 레코드는 건너뛰며 엔진에는 전달되지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! let router = NormalizerRouter::with_defaults();
//! let entries = router.normalize(b"Jan 10 07:32:14 host sshd[42]: Failed password for root from 1.2.3.4")?;
//! ```

pub mod cloudtrail;
pub mod linux;
pub mod records;
pub mod windows;

pub use cloudtrail::CloudTrailParser;
pub use linux::LinuxAuthParser;
pub use records::RecordParser;
pub use windows::WindowsEventParser;

use std::fmt;

use metrics::counter;
use serde_json::Value;
use threatlens_core::error::ThreatlensError;
use threatlens_core::metrics as m;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_core::types::LogEntry;
use tracing::debug;

use crate::error::DetectionPipelineError;

/// 정규화기 기본 최대 입력 크기 (64MB)
pub const DEFAULT_MAX_INPUT_SIZE: usize = 64 * 1024 * 1024;

/// 입력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    Linux,
    Windows,
    CloudTrail,
    Records,
}

impl LogFormat {
    /// 전체 형식 목록
    pub const ALL: [LogFormat; 4] = [Self::Linux, Self::Windows, Self::CloudTrail, Self::Records];

    /// 정규화기 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::CloudTrail => "cloudtrail",
            Self::Records => "records",
        }
    }

    /// 문자열에서 형식을 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linux" | "auth" | "syslog" => Some(Self::Linux),
            "windows" | "win" | "jsonl" => Some(Self::Windows),
            "cloudtrail" | "cloud" | "aws" => Some(Self::CloudTrail),
            "records" | "json" => Some(Self::Records),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 정규화기 라우터
pub struct NormalizerRouter {
    /// 등록된 정규화기 목록
    normalizers: Vec<Box<dyn LogNormalizer>>,
}

impl NormalizerRouter {
    /// 빈 라우터를 생성합니다.
    pub fn new() -> Self {
        Self {
            normalizers: Vec::new(),
        }
    }

    /// 기본 정규화기 세트로 라우터를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::with_max_input_size(DEFAULT_MAX_INPUT_SIZE)
    }

    /// 지정한 입력 상한으로 기본 정규화기 세트를 생성합니다.
    pub fn with_max_input_size(max_input_size: usize) -> Self {
        Self::new()
            .register(Box::new(
                LinuxAuthParser::new().with_max_input_size(max_input_size),
            ))
            .register(Box::new(
                WindowsEventParser::new().with_max_input_size(max_input_size),
            ))
            .register(Box::new(
                CloudTrailParser::new().with_max_input_size(max_input_size),
            ))
            .register(Box::new(
                RecordParser::new().with_max_input_size(max_input_size),
            ))
    }

    /// 정규화기를 등록합니다.
    pub fn register(mut self, normalizer: Box<dyn LogNormalizer>) -> Self {
        self.normalizers.push(normalizer);
        self
    }

    /// 입력 앞부분을 보고 형식을 판별합니다.
    ///
    /// - `{` 로 시작하고 `"Records"`를 포함 → cloudtrail
    /// - `{` 로 시작 → windows (JSONL)
    /// - `[` 로 시작 → records
    /// - 그 외 → linux
    pub fn detect_format(raw: &[u8]) -> LogFormat {
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') {
            if trimmed.contains("\"Records\"") {
                LogFormat::CloudTrail
            } else {
                LogFormat::Windows
            }
        } else if trimmed.starts_with('[') {
            LogFormat::Records
        } else {
            LogFormat::Linux
        }
    }

    /// 형식을 자동 판별하여 정규화합니다.
    pub fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError> {
        let format = Self::detect_format(raw);
        debug!(format = %format, bytes = raw.len(), "detected log format");
        self.normalize_with(format.as_str(), raw)
    }

    /// 지정한 형식의 정규화기로 정규화합니다.
    pub fn normalize_with(
        &self,
        format_name: &str,
        raw: &[u8],
    ) -> Result<Vec<LogEntry>, ThreatlensError> {
        self.normalizers
            .iter()
            .find(|n| n.format_name() == format_name)
            .ok_or_else(|| DetectionPipelineError::UnsupportedFormat(format_name.to_owned()))?
            .normalize(raw)
    }

    /// 등록된 형식 이름 목록
    pub fn registered_formats(&self) -> Vec<&str> {
        self.normalizers.iter().map(|n| n.format_name()).collect()
    }
}

impl Default for NormalizerRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// --- 정규화기 공용 헬퍼 ---

/// 입력 크기 상한을 검사합니다.
fn ensure_size(raw: &[u8], max: usize) -> Result<(), DetectionPipelineError> {
    if raw.len() > max {
        return Err(DetectionPipelineError::InputTooLarge {
            size: raw.len(),
            max,
        });
    }
    Ok(())
}

/// 정규화 결과를 메트릭에 기록합니다.
fn record_outcome(format: &'static str, normalized: usize, skipped: usize) {
    counter!(m::NORMALIZER_ENTRIES_TOTAL, m::LABEL_FORMAT => format).increment(normalized as u64);
    if skipped > 0 {
        counter!(m::NORMALIZER_SKIPPED_TOTAL, m::LABEL_FORMAT => format).increment(skipped as u64);
        debug!(format, skipped, "skipped undecodable records");
    }
}

/// 후보 키 중 처음으로 비어 있지 않은 문자열 값을 찾습니다.
fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}
