//! 탐지 규칙 -- 소스별 우선순위 규칙
//!
//! 각 소스는 고정된 순서의 규칙 목록을 가지며, 엔트리 하나당
//! 처음 매칭된 규칙 하나만 탐지 결과를 만듭니다.
//!
//! # 아키텍처
//! - [`host_auth`]: 메시지 부분 문자열 기반 (sshd, sudo, cron)
//! - [`windows`]: 이벤트 ID 기반 (4625, 4624, 4672, 4688)
//! - [`cloud_audit`]: 에러 필드와 API 이름 접두어 기반
//!
//! [`RULE_CATALOG`]는 평가 순서 그대로 규칙을 기술하는 정적 테이블이며,
//! CLI의 `rules list` 출력에 사용됩니다.

pub mod cloud_audit;
pub mod host_auth;
pub mod windows;

use serde::Serialize;
use threatlens_core::types::{Category, LogSource};

/// 규칙 설명자
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    /// 규칙 ID
    pub id: &'static str,
    /// 적용 소스
    pub source: LogSource,
    /// 규칙 이름
    pub title: &'static str,
    /// 생성되는 카테고리
    pub category: Category,
    /// 심각도 결정 방식
    pub severity: &'static str,
}

/// 전체 규칙 카탈로그 (소스별 평가 순서)
pub static RULE_CATALOG: [RuleDescriptor; 14] = [
    // 호스트 인증
    RuleDescriptor {
        id: "ssh_failed_password",
        source: LogSource::HostAuth,
        title: "SSH failed password",
        category: Category::BruteForce,
        severity: "high if attempts > 5, medium if >= 3, else low",
    },
    RuleDescriptor {
        id: "ssh_accepted_password",
        source: LogSource::HostAuth,
        title: "SSH password login",
        category: Category::SuspiciousLogin,
        severity: "high for a new source ip, else info",
    },
    RuleDescriptor {
        id: "ssh_publickey_login",
        source: LogSource::HostAuth,
        title: "SSH public key login",
        category: Category::LateralMovement,
        severity: "info",
    },
    RuleDescriptor {
        id: "sudo_command",
        source: LogSource::HostAuth,
        title: "sudo command execution",
        category: Category::PrivilegeEscalation,
        severity: "medium",
    },
    RuleDescriptor {
        id: "cron_command",
        source: LogSource::HostAuth,
        title: "cron command execution",
        category: Category::Persistence,
        severity: "high if the command runs from /tmp/, else medium",
    },
    RuleDescriptor {
        id: "shadow_access",
        source: LogSource::HostAuth,
        title: "/etc/shadow access",
        category: Category::CredentialAccess,
        severity: "high",
    },
    // Windows
    RuleDescriptor {
        id: "win_logon_failure",
        source: LogSource::Windows,
        title: "Failed logon (4625)",
        category: Category::BruteForce,
        severity: "medium",
    },
    RuleDescriptor {
        id: "win_logon_success",
        source: LogSource::Windows,
        title: "Successful logon (4624)",
        category: Category::SuspiciousLogin,
        severity: "info",
    },
    RuleDescriptor {
        id: "win_special_privileges",
        source: LogSource::Windows,
        title: "Privileged logon (4672)",
        category: Category::PrivilegeEscalation,
        severity: "high",
    },
    RuleDescriptor {
        id: "win_process_creation",
        source: LogSource::Windows,
        title: "Process creation (4688)",
        category: Category::ProcessCreation,
        severity: "high for powershell/cmd.exe, medium for temp paths, else low",
    },
    // 클라우드 감사
    RuleDescriptor {
        id: "cloud_unauthorized_call",
        source: LogSource::CloudAudit,
        title: "Unauthorized API call",
        category: Category::IamMisuse,
        severity: "high",
    },
    RuleDescriptor {
        id: "cloud_console_login_failure",
        source: LogSource::CloudAudit,
        title: "Failed console login",
        category: Category::SuspiciousLogin,
        severity: "medium",
    },
    RuleDescriptor {
        id: "cloud_policy_modification",
        source: LogSource::CloudAudit,
        title: "IAM policy modification",
        category: Category::PrivilegeEscalation,
        severity: "high",
    },
    RuleDescriptor {
        id: "cloud_read_action",
        source: LogSource::CloudAudit,
        title: "Sensitive read action",
        category: Category::Reconnaissance,
        severity: "low",
    },
];

/// 특정 소스의 규칙을 평가 순서대로 반환합니다.
pub fn rules_for(source: LogSource) -> impl Iterator<Item = &'static RuleDescriptor> {
    RULE_CATALOG.iter().filter(move |rule| rule.source == source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<_> = RULE_CATALOG.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), RULE_CATALOG.len());
    }

    #[test]
    fn rules_per_source() {
        assert_eq!(rules_for(LogSource::HostAuth).count(), 6);
        assert_eq!(rules_for(LogSource::Windows).count(), 4);
        assert_eq!(rules_for(LogSource::CloudAudit).count(), 4);
    }

    #[test]
    fn catalog_only_uses_known_categories() {
        for rule in &RULE_CATALOG {
            assert!(
                Category::KNOWN.contains(&rule.category),
                "{} uses unknown category",
                rule.id
            );
        }
    }

    #[test]
    fn every_known_category_has_a_rule() {
        for category in Category::KNOWN {
            assert!(
                RULE_CATALOG.iter().any(|r| r.category == category),
                "no rule produces {category}"
            );
        }
    }
}
