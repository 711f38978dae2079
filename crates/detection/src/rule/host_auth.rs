//! 호스트 인증 로그 규칙
//!
//! 메시지 부분 문자열로 판정합니다. 평가 순서:
//! failed password → accepted password → publickey → sudo → cron → /etc/shadow

use threatlens_core::types::{Category, Finding, HostAuthEntry, LogEntry, Severity};

use crate::engine::DetectionState;
use crate::extract::{extract_ip, extract_sudo_user, extract_username};

const FAILED_PASSWORD: &str = "Failed password";
const ACCEPTED_PASSWORD: &str = "Accepted password";
const PUBLICKEY_SUCCESS: &str = "Authentication succeeded (publickey)";
const SUDO_PROCESS: &str = "sudo";
const SUDO_COMMAND: &str = "COMMAND=";
const CRON_MARKER: &str = "CRON";
const CRON_COMMAND: &str = "CMD=";
const SHADOW_FILE: &str = "/etc/shadow";

/// 호스트 인증 엔트리를 평가합니다.
///
/// 실패 / 성공 로그인 규칙은 `state`의 카운터와 관측 IP 집합을 변경합니다.
pub fn evaluate(state: &mut DetectionState, entry: &HostAuthEntry, log: &LogEntry) -> Option<Finding> {
    let msg = entry.message.as_str();

    if msg.contains(FAILED_PASSWORD) {
        let ip = extract_ip(msg);
        let user = extract_username(msg);
        let count = state.record_failure(user, ip);

        return Some(
            Finding::new(
                brute_force_severity(count),
                Category::BruteForce,
                format!("Multiple failed SSH login attempts ({count})"),
                log.clone(),
            )
            .with_user(user)
            .with_ip(ip),
        );
    }

    if msg.contains(ACCEPTED_PASSWORD) {
        let ip = extract_ip(msg);
        let user = extract_username(msg);
        let severity = if state.observe_login(ip) {
            Severity::High
        } else {
            Severity::Info
        };

        return Some(
            Finding::new(
                severity,
                Category::SuspiciousLogin,
                format!("Successful SSH login from new IP address {ip}"),
                log.clone(),
            )
            .with_user(user)
            .with_ip(ip),
        );
    }

    if msg.contains(PUBLICKEY_SUCCESS) {
        return Some(
            Finding::new(
                Severity::Info,
                Category::LateralMovement,
                "SSH login using public key authentication",
                log.clone(),
            )
            .with_user(extract_username(msg))
            .with_ip(extract_ip(msg)),
        );
    }

    if entry.process == SUDO_PROCESS && msg.contains(SUDO_COMMAND) {
        return Some(
            Finding::new(
                Severity::Medium,
                Category::PrivilegeEscalation,
                "Privilege escalation via sudo command execution",
                log.clone(),
            )
            .with_user(extract_sudo_user(msg)),
        );
    }

    if msg.contains(CRON_MARKER) && msg.contains(CRON_COMMAND) {
        let severity = if msg.contains("/tmp/") {
            Severity::High
        } else {
            Severity::Medium
        };
        return Some(Finding::new(
            severity,
            Category::Persistence,
            "Scheduled task executed via cron",
            log.clone(),
        ));
    }

    if msg.contains(SHADOW_FILE) {
        return Some(Finding::new(
            Severity::High,
            Category::CredentialAccess,
            "Access to sensitive credential file /etc/shadow",
            log.clone(),
        ));
    }

    None
}

/// 누적 실패 횟수에 따른 심각도
///
/// `count > 5` → high, `count >= 3` → medium, 그 외 low
pub fn brute_force_severity(count: u32) -> Severity {
    match count {
        c if c > 5 => Severity::High,
        c if c >= 3 => Severity::Medium,
        _ => Severity::Low,
    }
}
