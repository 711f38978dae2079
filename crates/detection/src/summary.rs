//! 인시던트 요약 -- advisory 협력자 입력

use std::collections::BTreeSet;

use threatlens_core::types::{AnnotatedFinding, IncidentSummary};

/// 매핑된 탐지 결과를 간결한 요약으로 변환합니다.
///
/// 집합 필드는 정렬되어 있으며 중복이 없습니다.
pub fn summarize(findings: &[AnnotatedFinding]) -> IncidentSummary {
    let mut categories = BTreeSet::new();
    let mut techniques = BTreeSet::new();
    let mut users = BTreeSet::new();
    let mut ips = BTreeSet::new();

    for annotated in findings {
        let finding = &annotated.finding;
        categories.insert(finding.category.to_string());
        techniques.insert(annotated.mitre_id.clone());
        if let Some(user) = finding.user.as_deref().filter(|u| !u.is_empty()) {
            users.insert(user.to_owned());
        }
        if let Some(ip) = finding.ip.as_deref().filter(|ip| !ip.is_empty()) {
            ips.insert(ip.to_owned());
        }
    }

    IncidentSummary {
        max_severity: findings.iter().map(|a| a.finding.severity).max(),
        categories: categories.into_iter().collect(),
        mitre_techniques: techniques.into_iter().collect(),
        affected_users: users.into_iter().collect(),
        affected_ips: ips.into_iter().collect(),
        event_count: findings.len(),
    }
}
