//! CloudTrail 정규화기
//!
//! `{"Records": [...]}` 문서 또는 레코드 배열을 받아 클라우드 감사 엔트리로 변환합니다.
//! `eventName`이 없거나 필드 타입이 맞지 않는 레코드는 건너뜁니다.

use serde::Deserialize;
use serde_json::Value;
use threatlens_core::error::ThreatlensError;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_core::types::{CloudAuditEntry, LogEntry, UNKNOWN, UserIdentity};
use tracing::trace;

use super::{DEFAULT_MAX_INPUT_SIZE, ensure_size, record_outcome};
use crate::error::DetectionPipelineError;

/// CloudTrail 원본 레코드 (JSON 키 그대로)
#[derive(Debug, Deserialize)]
struct CloudTrailRecord {
    #[serde(rename = "eventName")]
    event_name: String,

    #[serde(rename = "eventTime", default)]
    event_time: Option<String>,

    #[serde(rename = "sourceIPAddress", default)]
    source_ip: Option<String>,

    #[serde(rename = "userIdentity", default)]
    user_identity: Option<RawIdentity>,

    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,

    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdentity {
    #[serde(rename = "userName", default)]
    user_name: Option<String>,
    #[serde(default)]
    arn: Option<String>,
    #[serde(rename = "principalId", default)]
    principal_id: Option<String>,
}

/// CloudTrail 정규화기
pub struct CloudTrailParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl CloudTrailParser {
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

    /// 원본 레코드 하나를 정규화합니다.
    pub fn normalize_record(record: &Value) -> Option<CloudAuditEntry> {
        let parsed = match CloudTrailRecord::deserialize(record) {
            Ok(parsed) => parsed,
            Err(e) => {
                trace!(error = %e, "undecodable cloudtrail record");
                return None;
            }
        };
        let identity = parsed.user_identity.unwrap_or_default();

        Some(CloudAuditEntry {
            event_name: parsed.event_name,
            event_time: parsed.event_time,
            source_ip: parsed
                .source_ip
                .filter(|ip| !ip.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            user_identity: UserIdentity {
                user_name: identity.user_name,
                arn: identity.arn,
                principal_id: identity.principal_id,
            },
            error_code: parsed.error_code,
            error_message: parsed.error_message,
            raw: record.clone(),
        })
    }
}

impl Default for CloudTrailParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogNormalizer for CloudTrailParser {
    fn format_name(&self) -> &str {
        "cloudtrail"
    }

    fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError> {
        ensure_size(raw, self.max_input_size)?;

        let document: Value =
            serde_json::from_slice(raw).map_err(DetectionPipelineError::from)?;
        let records: &[Value] = match &document {
            Value::Object(map) => match map.get("Records") {
                Some(Value::Array(records)) => records.as_slice(),
                Some(_) => {
                    return Err(DetectionPipelineError::Parse {
                        format: "cloudtrail".to_owned(),
                        offset: 0,
                        reason: "Records is not an array".to_owned(),
                    }
                    .into());
                }
                None => &[],
            },
            Value::Array(records) => records.as_slice(),
            _ => {
                return Err(DetectionPipelineError::Parse {
                    format: "cloudtrail".to_owned(),
                    offset: 0,
                    reason: "expected an object with Records or an array".to_owned(),
                }
                .into());
            }
        };

        let entries: Vec<_> = records
            .iter()
            .filter_map(Self::normalize_record)
            .map(LogEntry::CloudAudit)
            .collect();

        record_outcome("cloudtrail", entries.len(), records.len() - entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_records_document() {
        let raw = br#"{"Records": [
            {"eventName": "GetObject", "eventTime": "2024-01-10T09:00:00Z",
             "sourceIPAddress": "198.51.100.4",
             "userIdentity": {"type": "IAMUser", "userName": "ci-bot", "arn": "arn:aws:iam::1:user/ci-bot"}},
            {"eventName": "ConsoleLogin", "errorMessage": "Failed authentication",
             "userIdentity": {"principalId": "AIDAEXAMPLE"}}
        ]}"#;
        let entries = CloudTrailParser::new().normalize(raw).unwrap();
        assert_eq!(entries.len(), 2);

        let LogEntry::CloudAudit(first) = &entries[0] else {
            panic!("expected cloud entry");
        };
        assert_eq!(first.event_name, "GetObject");
        assert_eq!(first.source_ip, "198.51.100.4");
        assert_eq!(first.user_identity.resolve(), "ci-bot");
        assert_eq!(first.event_time.as_deref(), Some("2024-01-10T09:00:00Z"));

        let LogEntry::CloudAudit(second) = &entries[1] else {
            panic!("expected cloud entry");
        };
        assert_eq!(second.source_ip, "unknown");
        assert_eq!(second.user_identity.resolve(), "AIDAEXAMPLE");
        assert_eq!(second.error_message.as_deref(), Some("Failed authentication"));
    }

    #[test]
    fn bare_array_is_accepted() {
        let raw = br#"[{"eventName": "ListUsers"}]"#;
        assert_eq!(CloudTrailParser::new().normalize(raw).unwrap().len(), 1);
    }

    #[test]
    fn document_without_records_is_empty() {
        assert!(CloudTrailParser::new().normalize(br#"{"foo": 1}"#).unwrap().is_empty());
    }

    #[test]
    fn records_without_event_name_are_skipped() {
        assert!(CloudTrailParser::normalize_record(&json!({"eventTime": "x"})).is_none());
        assert!(CloudTrailParser::normalize_record(&json!({"eventName": 42})).is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = CloudTrailParser::new().normalize(b"{\"Records\": [").unwrap_err();
        assert!(matches!(err, ThreatlensError::Parse(_)));
    }

    #[test]
    fn scalar_document_is_an_error() {
        assert!(CloudTrailParser::new().normalize(b"42").is_err());
        assert!(CloudTrailParser::new().normalize(br#"{"Records": 1}"#).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
                let _ = CloudTrailParser::new().normalize(&bytes);
            }
        }
    }
}
