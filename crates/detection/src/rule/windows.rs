//! Windows 보안 이벤트 규칙 (이벤트 ID 기반)

use threatlens_core::types::{Category, Finding, LogEntry, Severity, WindowsEntry};

/// 로그온 실패
pub const EVENT_LOGON_FAILURE: u32 = 4625;
/// 로그온 성공
pub const EVENT_LOGON_SUCCESS: u32 = 4624;
/// 특수 권한 할당
pub const EVENT_SPECIAL_PRIVILEGES: u32 = 4672;
/// 프로세스 생성
pub const EVENT_PROCESS_CREATION: u32 = 4688;

/// Windows 엔트리를 평가합니다. 나머지 이벤트 ID는 탐지 결과가 없습니다.
pub fn evaluate(entry: &WindowsEntry, log: &LogEntry) -> Option<Finding> {
    let (severity, category, description) = match entry.event_id {
        EVENT_LOGON_FAILURE => (
            Severity::Medium,
            Category::BruteForce,
            "Failed Windows login attempt".to_owned(),
        ),
        EVENT_LOGON_SUCCESS => (
            Severity::Info,
            Category::SuspiciousLogin,
            "Successful Windows login".to_owned(),
        ),
        EVENT_SPECIAL_PRIVILEGES => (
            Severity::High,
            Category::PrivilegeEscalation,
            "Privileged account logged on".to_owned(),
        ),
        EVENT_PROCESS_CREATION => (
            process_severity(&entry.process),
            Category::ProcessCreation,
            format!("Process created: {}", entry.process),
        ),
        _ => return None,
    };

    Some(
        Finding::new(severity, category, description, log.clone())
            .with_user(entry.user.as_str())
            .with_ip(entry.ip.as_str()),
    )
}

/// 프로세스 경로에 따른 심각도 (대소문자 무시)
fn process_severity(process: &str) -> Severity {
    let lower = process.to_lowercase();
    if lower.contains("powershell") || lower.contains("cmd.exe") {
        Severity::High
    } else if lower.contains("temp") {
        Severity::Medium
    } else {
        Severity::Low
    }
}
