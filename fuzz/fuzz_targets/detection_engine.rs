#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

use threatlens_core::types::{
    CloudAuditEntry, HostAuthEntry, LogEntry, UserIdentity, WindowsEntry,
};
use threatlens_detection::{DetectionEngine, DetectionState, TechniqueMapper};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
enum FuzzEntry {
    Host {
        process: String,
        message: String,
    },
    Windows {
        event_id: u32,
        user: String,
        ip: String,
        process: String,
    },
    Cloud {
        event_name: String,
        user_name: Option<String>,
        error_code: Option<String>,
        error_message: Option<String>,
    },
}

impl FuzzEntry {
    fn into_entry(self) -> LogEntry {
        match self {
            FuzzEntry::Host { process, message } => LogEntry::HostAuth(HostAuthEntry {
                process,
                message,
                ..Default::default()
            }),
            FuzzEntry::Windows {
                event_id,
                user,
                ip,
                process,
            } => LogEntry::Windows(WindowsEntry {
                timestamp: None,
                event_id,
                user,
                ip,
                process,
                message: String::new(),
                raw: Value::Null,
            }),
            FuzzEntry::Cloud {
                event_name,
                user_name,
                error_code,
                error_message,
            } => LogEntry::CloudAudit(CloudAuditEntry {
                event_name,
                event_time: None,
                source_ip: "203.0.113.7".to_owned(),
                user_identity: UserIdentity {
                    user_name,
                    ..Default::default()
                },
                error_code,
                error_message,
                raw: Value::Null,
            }),
        }
    }
}

fuzz_target!(|input: Vec<FuzzEntry>| {
    // 작은 상한으로 상태 초기화 경로도 함께 실행
    let state = DetectionState::new().with_max_tracked_keys(16);
    let mut engine = DetectionEngine::with_state(state);

    let entries: Vec<LogEntry> = input.into_iter().take(256).map(FuzzEntry::into_entry).collect();
    let findings = engine.analyze(&entries);

    assert!(engine.state().tracked_keys() <= 16 + 1);
    let mapper = TechniqueMapper::new();
    for finding in findings {
        let annotated = mapper.map(finding);
        assert!(!annotated.mitre_id.is_empty());
    }
});
