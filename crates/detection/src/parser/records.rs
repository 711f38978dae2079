//! 레코드 정규화기 -- 소스 태그가 없는 정규화 레코드
//!
//! JSON 배열 또는 JSONL로 주어진 평탄한 레코드를 필드 존재 여부로 분류합니다.
//! 분류 우선순위:
//!
//! 1. `source == "windows"` → Windows
//! 2. `source`가 `host_auth` / `cloud_audit` 태그 → 태그 그대로 역직렬화
//! 3. 비어 있지 않은 `process` → 호스트 인증
//! 4. `event_id` 또는 `EventID` → Windows
//! 5. `eventName` → 클라우드 감사
//!
//! 어느 쪽에도 해당하지 않는 레코드는 건너뜁니다.

use serde::Deserialize;
use serde_json::Value;
use threatlens_core::error::ThreatlensError;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_core::types::{HostAuthEntry, LogEntry, LogSource};
use tracing::trace;

use super::{
    CloudTrailParser, DEFAULT_MAX_INPUT_SIZE, WindowsEventParser, ensure_size, record_outcome,
};
use crate::error::DetectionPipelineError;

/// 레코드 정규화기
pub struct RecordParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl RecordParser {
    /// 기본 설정으로 새 정규화기를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 레코드의 소스를 판별합니다.
    pub fn classify(record: &Value) -> Option<LogSource> {
        let source = record.get("source").and_then(Value::as_str);
        if source == Some("windows") {
            return Some(LogSource::Windows);
        }
        match source {
            Some("host_auth") => return Some(LogSource::HostAuth),
            Some("cloud_audit") => return Some(LogSource::CloudAudit),
            _ => {}
        }
        if record
            .get("process")
            .and_then(Value::as_str)
            .is_some_and(|p| !p.is_empty())
        {
            return Some(LogSource::HostAuth);
        }
        if record.get("event_id").is_some() || record.get("EventID").is_some() {
            return Some(LogSource::Windows);
        }
        if record.get("eventName").is_some() {
            return Some(LogSource::CloudAudit);
        }
        None
    }

    /// 레코드 하나를 정규화합니다.
    ///
    /// 태그가 붙은 레코드가 정규화된 필드 모양이 아니면 원본 키
    /// (`eventName`, `EventID` 등) 정규화기로 다시 시도합니다.
    pub fn normalize_record(record: &Value) -> Option<LogEntry> {
        let source = Self::classify(record)?;
        let tagged = record
            .get("source")
            .and_then(Value::as_str)
            .is_some_and(|s| s == source.as_str());

        if tagged && source != LogSource::Windows {
            if let Ok(entry) = LogEntry::deserialize(record) {
                return Some(entry);
            }
        }

        match source {
            LogSource::Windows => WindowsEventParser::normalize_event(record).map(LogEntry::Windows),
            LogSource::HostAuth => HostAuthEntry::deserialize(record)
                .ok()
                .map(LogEntry::HostAuth),
            LogSource::CloudAudit => {
                CloudTrailParser::normalize_record(record).map(LogEntry::CloudAudit)
            }
        }
    }

    fn parse_records(text: &str) -> Result<Vec<Value>, DetectionPipelineError> {
        if text.trim_start().starts_with('[') {
            return match serde_json::from_str::<Value>(text)? {
                Value::Array(records) => Ok(records),
                _ => Err(DetectionPipelineError::Parse {
                    format: "records".to_owned(),
                    offset: 0,
                    reason: "expected a JSON array".to_owned(),
                }),
            };
        }

        let mut records = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(record) => records.push(record),
                Err(e) => trace!(line = line_no + 1, error = %e, "undecodable record line"),
            }
        }
        Ok(records)
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogNormalizer for RecordParser {
    fn format_name(&self) -> &str {
        "records"
    }

    fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError> {
        ensure_size(raw, self.max_input_size)?;

        let text = String::from_utf8_lossy(raw);
        let records = Self::parse_records(&text)?;
        let entries: Vec<_> = records.iter().filter_map(Self::normalize_record).collect();

        record_outcome("records", entries.len(), records.len() - entries.len());
        Ok(entries)
    }
}
