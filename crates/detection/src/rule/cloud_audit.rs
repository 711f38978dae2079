//! 클라우드 API 감사 로그 규칙
//!
//! 평가 순서: unauthorized → 콘솔 로그인 실패 → 정책 변경 → 읽기 API

use threatlens_core::types::{Category, CloudAuditEntry, Finding, LogEntry, Severity};

const UNAUTHORIZED: &str = "Unauthorized";
const CONSOLE_LOGIN: &str = "ConsoleLogin";
const POLICY_WRITE_PREFIXES: [&str; 3] = ["Put", "Attach", "Create"];
const READ_PREFIXES: [&str; 3] = ["Get", "Describe", "List"];

/// 클라우드 감사 엔트리를 평가합니다.
pub fn evaluate(entry: &CloudAuditEntry, log: &LogEntry) -> Option<Finding> {
    let name = entry.event_name.as_str();
    let error_code = entry.error_code.as_deref().unwrap_or_default();
    let error_message = entry.error_message.as_deref().unwrap_or_default();

    let (severity, category, description) =
        if error_code.contains(UNAUTHORIZED) || error_message.contains(UNAUTHORIZED) {
            (
                Severity::High,
                Category::IamMisuse,
                format!("Unauthorized AWS API call: {name}"),
            )
        } else if name == CONSOLE_LOGIN && !error_message.is_empty() {
            (
                Severity::Medium,
                Category::SuspiciousLogin,
                format!("Failed AWS console login: {error_message}"),
            )
        } else if starts_with_any(name, &POLICY_WRITE_PREFIXES) && name.contains("Policy") {
            (
                Severity::High,
                Category::PrivilegeEscalation,
                format!("IAM policy modification: {name}"),
            )
        } else if starts_with_any(name, &READ_PREFIXES) {
            (
                Severity::Low,
                Category::Reconnaissance,
                format!("Sensitive AWS API read action: {name}"),
            )
        } else {
            return None;
        };

    Some(
        Finding::new(severity, category, description, log.clone())
            .with_user(entry.user_identity.resolve())
            .with_ip(entry.source_ip.as_str()),
    )
}

fn starts_with_any(name: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p))
}
