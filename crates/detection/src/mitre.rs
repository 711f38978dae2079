//! MITRE ATT&CK 기법 매핑
//!
//! [`TechniqueRegistry`]는 카테고리 → 기법의 불변 정적 테이블입니다.
//! 레지스트리에 없는 카테고리는 [`UNKNOWN_TECHNIQUE`] (T0000)로 매핑됩니다.

use serde::Serialize;
use threatlens_core::types::{AnnotatedFinding, Category, Finding};

/// ATT&CK 기법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Technique {
    /// 기법 식별자 (예: "T1110")
    pub id: &'static str,
    /// 기법 이름
    pub name: &'static str,
}

/// 미매핑 카테고리의 기법
pub const UNKNOWN_TECHNIQUE: Technique = Technique {
    id: "T0000",
    name: "Unknown Technique",
};

/// 카테고리 표시 이름 → 기법
static REGISTRY: [(&str, Technique); 9] = [
    (
        "Brute Force",
        Technique {
            id: "T1110",
            name: "Brute Force",
        },
    ),
    (
        "Suspicious Login",
        Technique {
            id: "T1078",
            name: "Valid Accounts",
        },
    ),
    (
        "Privilege Escalation",
        Technique {
            id: "T1068",
            name: "Exploitation for Privilege Escalation",
        },
    ),
    (
        "Process Creation",
        Technique {
            id: "T1059",
            name: "Command and Scripting Interpreter",
        },
    ),
    (
        "IAM Misuse",
        Technique {
            id: "T1078",
            name: "Valid Accounts",
        },
    ),
    (
        "Credential Access",
        Technique {
            id: "T1003",
            name: "Credential Dumping",
        },
    ),
    (
        "Lateral Movement",
        Technique {
            id: "T1021",
            name: "Remote Services",
        },
    ),
    (
        "Persistence",
        Technique {
            id: "T1053",
            name: "Scheduled Task/Job",
        },
    ),
    (
        "Reconnaissance",
        Technique {
            id: "T1595",
            name: "Active Scanning",
        },
    ),
];

/// 불변 기법 레지스트리
#[derive(Debug, Clone, Copy)]
pub struct TechniqueRegistry {
    entries: &'static [(&'static str, Technique)],
}

impl TechniqueRegistry {
    /// 내장 테이블 레지스트리
    pub fn builtin() -> Self {
        Self { entries: &REGISTRY }
    }

    /// 카테고리의 기법을 조회합니다.
    pub fn lookup(&self, category: &Category) -> Option<Technique> {
        let name = category.as_str();
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, technique)| *technique)
    }

    /// 카테고리의 기법을 반환합니다. 없으면 T0000입니다.
    pub fn resolve(&self, category: &Category) -> Technique {
        self.lookup(category).unwrap_or(UNKNOWN_TECHNIQUE)
    }

    /// 등록된 (카테고리, 기법) 목록
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Technique)> + '_ {
        self.entries.iter().copied()
    }

    /// 등록된 항목 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TechniqueRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 기법 매퍼 -- 카테고리만 보고 기법을 부착하는 순수 함수
#[derive(Debug, Clone, Copy, Default)]
pub struct TechniqueMapper {
    registry: TechniqueRegistry,
}

impl TechniqueMapper {
    /// 내장 레지스트리로 매퍼를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 탐지 결과에 기법을 부착합니다.
    ///
    /// 심각도, 카테고리, 사용자, IP는 변경하지 않습니다.
    pub fn map(&self, finding: Finding) -> AnnotatedFinding {
        let technique = self.registry.resolve(&finding.category);
        AnnotatedFinding {
            finding,
            mitre_id: technique.id.to_owned(),
            mitre_name: technique.name.to_owned(),
        }
    }

    /// 이미 주석이 붙은 결과를 다시 매핑합니다. 조회 키는 카테고리뿐입니다.
    pub fn remap(&self, annotated: AnnotatedFinding) -> AnnotatedFinding {
        self.map(annotated.into())
    }

    /// 여러 결과를 매핑합니다.
    pub fn map_all(&self, findings: impl IntoIterator<Item = Finding>) -> Vec<AnnotatedFinding> {
        findings.into_iter().map(|f| self.map(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatlens_core::types::{HostAuthEntry, LogEntry, Severity};

    fn finding(category: Category) -> Finding {
        Finding::new(
            Severity::Medium,
            category,
            "test",
            LogEntry::HostAuth(HostAuthEntry::default()),
        )
        .with_user("admin")
        .with_ip("1.2.3.4")
    }

    #[test]
    fn registry_has_no_duplicate_keys() {
        let registry = TechniqueRegistry::builtin();
        let mut keys: Vec<_> = registry.iter().map(|(k, _)| k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), registry.len());
    }

    #[test]
    fn every_known_category_is_mapped() {
        let registry = TechniqueRegistry::builtin();
        for category in Category::KNOWN {
            assert!(registry.lookup(&category).is_some(), "{category} unmapped");
        }
    }

    #[test]
    fn iam_misuse_maps_to_valid_accounts() {
        let technique = TechniqueRegistry::builtin().resolve(&Category::IamMisuse);
        assert_eq!(technique.id, "T1078");
        assert_eq!(technique.name, "Valid Accounts");
    }

    #[test]
    fn authoritative_table() {
        let registry = TechniqueRegistry::builtin();
        let expected = [
            (Category::BruteForce, "T1110"),
            (Category::SuspiciousLogin, "T1078"),
            (Category::PrivilegeEscalation, "T1068"),
            (Category::ProcessCreation, "T1059"),
            (Category::CredentialAccess, "T1003"),
            (Category::LateralMovement, "T1021"),
            (Category::Persistence, "T1053"),
            (Category::Reconnaissance, "T1595"),
        ];
        for (category, id) in expected {
            assert_eq!(registry.resolve(&category).id, id, "{category}");
        }
    }

    #[test]
    fn mapper_annotates_from_builtin_table() {
        let mapper = TechniqueMapper::new();
        for (name, technique) in TechniqueRegistry::builtin().iter() {
            let annotated = mapper.map(finding(Category::from_name(name)));
            assert_eq!(annotated.mitre_id, technique.id, "{name}");
            assert_eq!(annotated.mitre_name, technique.name, "{name}");
        }
    }

    #[test]
    fn unknown_category_maps_to_t0000() {
        let mapper = TechniqueMapper::new();
        let annotated = mapper.map(finding(Category::from_name("UnknownCategory")));
        assert_eq!(annotated.mitre_id, "T0000");
        assert_eq!(annotated.mitre_name, "Unknown Technique");
    }

    #[test]
    fn mapping_preserves_finding_fields() {
        let original = finding(Category::BruteForce);
        let annotated = TechniqueMapper::new().map(original.clone());
        assert_eq!(annotated.finding, original);
    }

    #[test]
    fn mapping_is_idempotent() {
        let mapper = TechniqueMapper::new();
        for category in Category::KNOWN
            .into_iter()
            .chain([Category::Other("Cloud Unauthorized".to_owned())])
        {
            let once = mapper.map(finding(category));
            let twice = mapper.remap(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn map_all_keeps_order() {
        let mapper = TechniqueMapper::new();
        let mapped = mapper.map_all([
            finding(Category::Persistence),
            finding(Category::Reconnaissance),
        ]);
        let ids: Vec<_> = mapped.iter().map(|a| a.mitre_id.as_str()).collect();
        assert_eq!(ids, ["T1053", "T1595"]);
    }
}
