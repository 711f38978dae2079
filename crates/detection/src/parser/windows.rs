//! Windows 보안 이벤트 정규화기 (JSONL)
//!
//! Winlogbeat / EventLog JSON 레코드의 흔한 필드 이름을 정규화합니다.
//! 이벤트 ID가 없거나 디코딩할 수 없는 라인은 건너뜁니다.

use serde_json::Value;
use threatlens_core::error::ThreatlensError;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_core::types::{LogEntry, UNKNOWN, WindowsEntry};
use tracing::trace;

use super::{DEFAULT_MAX_INPUT_SIZE, ensure_size, first_str, record_outcome};

const EVENT_ID_KEYS: [&str; 2] = ["EventID", "event_id"];
const TIMESTAMP_KEYS: [&str; 3] = ["TimeCreated", "@timestamp", "timestamp"];
const USER_KEYS: [&str; 4] = ["TargetUserName", "SubjectUserName", "UserName", "user"];
const IP_KEYS: [&str; 4] = ["IpAddress", "SourceIp", "ClientAddress", "ip"];
const PROCESS_KEYS: [&str; 3] = ["NewProcessName", "ProcessName", "process"];
const MESSAGE_KEYS: [&str; 2] = ["Message", "message"];

/// Windows 이벤트 정규화기
pub struct WindowsEventParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl WindowsEventParser {
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

    /// JSON 레코드 하나를 정규화합니다.
    ///
    /// 이벤트 ID가 없거나 0이면 `None`입니다. 숫자 문자열 ID도 허용합니다.
    pub fn normalize_event(event: &Value) -> Option<WindowsEntry> {
        let event_id = EVENT_ID_KEYS
            .iter()
            .filter_map(|key| event.get(*key))
            .find_map(event_id_of)?;

        Some(WindowsEntry {
            timestamp: first_str(event, &TIMESTAMP_KEYS).map(str::to_owned),
            event_id,
            user: first_str(event, &USER_KEYS).unwrap_or(UNKNOWN).to_owned(),
            ip: first_str(event, &IP_KEYS).unwrap_or(UNKNOWN).to_owned(),
            process: first_str(event, &PROCESS_KEYS).unwrap_or_default().to_owned(),
            message: first_str(event, &MESSAGE_KEYS).unwrap_or_default().to_owned(),
            raw: event.clone(),
        })
    }
}

impl Default for WindowsEventParser {
    fn default() -> Self {
        Self::new()
    }
}

fn event_id_of(value: &Value) -> Option<u32> {
    let id = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }?;
    (id != 0).then_some(id)
}

impl LogNormalizer for WindowsEventParser {
    fn format_name(&self) -> &str {
        "windows"
    }

    fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError> {
        ensure_size(raw, self.max_input_size)?;

        let text = String::from_utf8_lossy(raw);
        let mut entries = Vec::new();
        let mut skipped = 0;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let normalized = match serde_json::from_str::<Value>(line) {
                Ok(event) => Self::normalize_event(&event),
                Err(e) => {
                    trace!(line = line_no + 1, error = %e, "undecodable windows event");
                    None
                }
            };
            match normalized {
                Some(entry) => entries.push(LogEntry::Windows(entry)),
                None => skipped += 1,
            }
        }

        record_outcome("windows", entries.len(), skipped);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_winlogbeat_fields() {
        let event = json!({
            "EventID": 4625,
            "TimeCreated": "2024-01-10T08:15:01Z",
            "TargetUserName": "administrator",
            "IpAddress": "192.168.56.20",
            "Message": "An account failed to log on."
        });
        let entry = WindowsEventParser::normalize_event(&event).unwrap();
        assert_eq!(entry.event_id, 4625);
        assert_eq!(entry.timestamp.as_deref(), Some("2024-01-10T08:15:01Z"));
        assert_eq!(entry.user, "administrator");
        assert_eq!(entry.ip, "192.168.56.20");
        assert_eq!(entry.process, "");
        assert_eq!(entry.raw, event);
    }

    #[test]
    fn string_event_id_and_fallback_fields() {
        let event = json!({
            "event_id": "4688",
            "SubjectUserName": "svc_build",
            "NewProcessName": "C:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe"
        });
        let entry = WindowsEventParser::normalize_event(&event).unwrap();
        assert_eq!(entry.event_id, 4688);
        assert_eq!(entry.user, "svc_build");
        assert_eq!(entry.ip, "unknown");
        assert!(entry.process.ends_with("powershell.exe"));
        assert!(entry.timestamp.is_none());
    }

    #[test]
    fn missing_or_zero_event_id_is_skipped() {
        assert!(WindowsEventParser::normalize_event(&json!({"Message": "x"})).is_none());
        assert!(WindowsEventParser::normalize_event(&json!({"EventID": 0})).is_none());
        assert!(WindowsEventParser::normalize_event(&json!({"EventID": "abc"})).is_none());
    }

    #[test]
    fn normalize_jsonl_skips_bad_lines() {
        let raw = br#"{"EventID": 4624, "TargetUserName": "alice", "IpAddress": "10.0.0.8"}
not json
{"Message": "no id"}

{"EventID": 4672, "SubjectUserName": "admin"}
"#;
        let entries = WindowsEventParser::new().normalize(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| matches!(e, LogEntry::Windows(_))));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
                let _ = WindowsEventParser::new().normalize(&bytes);
            }

            #[test]
            fn any_positive_event_id_is_kept(id in 1u32..=u32::MAX) {
                let entry = WindowsEventParser::normalize_event(&serde_json::json!({"EventID": id}));
                prop_assert_eq!(entry.map(|e| e.event_id), Some(id));
            }
        }
    }
}
