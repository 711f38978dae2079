//! 탐지 결과 집계 -- (category, user, ip) 키 기반 중복 제거
//!
//! 같은 키의 탐지 결과는 하나만 남습니다. 심각도가 엄격히 더 높은 결과만
//! 기존 결과를 대체하므로, 동률이면 먼저 들어온 결과가 유지됩니다.
//! 출력 순서는 키가 처음 등장한 순서입니다.

use std::collections::HashMap;

use metrics::counter;
use threatlens_core::metrics as m;
use threatlens_core::types::Finding;

/// user / ip가 없을 때 키에 사용하는 자리표시자
const ABSENT: &str = "None";

/// 집계 키
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub category: String,
    pub user: String,
    pub ip: String,
}

impl AggregationKey {
    /// 탐지 결과에서 키를 만듭니다.
    pub fn of(finding: &Finding) -> Self {
        Self {
            category: finding.category.to_string(),
            user: finding.user.as_deref().unwrap_or(ABSENT).to_owned(),
            ip: finding.ip.as_deref().unwrap_or(ABSENT).to_owned(),
        }
    }
}

/// 배치 단위 집계기
#[derive(Debug, Default)]
pub struct FindingAggregator {
    /// 키 -> `findings` 인덱스
    index: HashMap<AggregationKey, usize>,
    findings: Vec<Finding>,
}

impl FindingAggregator {
    /// 빈 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 탐지 결과 하나를 접어 넣습니다.
    pub fn push(&mut self, finding: Finding) {
        let key = AggregationKey::of(&finding);
        match self.index.get(&key) {
            Some(&slot) => {
                if finding.severity > self.findings[slot].severity {
                    self.findings[slot] = finding;
                }
            }
            None => {
                self.index.insert(key, self.findings.len());
                self.findings.push(finding);
            }
        }
    }

    /// 현재까지 남은 고유 키 수
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// 집계를 끝내고 결과를 반환합니다.
    pub fn finish(self) -> Vec<Finding> {
        counter!(m::DETECTION_AGGREGATED_FINDINGS_TOTAL).increment(self.findings.len() as u64);
        self.findings
    }
}

impl Extend<Finding> for FindingAggregator {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        for finding in iter {
            self.push(finding);
        }
    }
}

/// 원시 탐지 결과를 키별로 하나씩 남깁니다.
pub fn aggregate(findings: impl IntoIterator<Item = Finding>) -> Vec<Finding> {
    let mut aggregator = FindingAggregator::new();
    aggregator.extend(findings);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatlens_core::types::{Category, HostAuthEntry, LogEntry, Severity};

    fn finding(severity: Severity, category: Category, user: Option<&str>, ip: Option<&str>) -> Finding {
        let mut f = Finding::new(
            severity,
            category,
            format!("{severity} finding"),
            LogEntry::HostAuth(HostAuthEntry::default()),
        );
        f.user = user.map(str::to_owned);
        f.ip = ip.map(str::to_owned);
        f
    }

    #[test]
    fn higher_severity_replaces() {
        let result = aggregate([
            finding(Severity::Low, Category::BruteForce, Some("admin"), Some("1.2.3.4")),
            finding(Severity::High, Category::BruteForce, Some("admin"), Some("1.2.3.4")),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].severity, Severity::High);
    }

    #[test]
    fn lower_severity_does_not_replace() {
        let result = aggregate([
            finding(Severity::High, Category::BruteForce, Some("admin"), Some("1.2.3.4")),
            finding(Severity::Low, Category::BruteForce, Some("admin"), Some("1.2.3.4")),
        ]);
        assert_eq!(result[0].severity, Severity::High);
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut first = finding(Severity::Medium, Category::Persistence, None, None);
        first.description = "first".to_owned();
        let mut second = finding(Severity::Medium, Category::Persistence, None, None);
        second.description = "second".to_owned();

        let result = aggregate([first, second]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].description, "first");
    }

    #[test]
    fn distinct_keys_survive_in_first_seen_order() {
        let result = aggregate([
            finding(Severity::Low, Category::BruteForce, Some("a"), Some("1.1.1.1")),
            finding(Severity::Low, Category::BruteForce, Some("b"), Some("1.1.1.1")),
            finding(Severity::Low, Category::SuspiciousLogin, Some("a"), Some("1.1.1.1")),
            finding(Severity::High, Category::BruteForce, Some("a"), Some("1.1.1.1")),
        ]);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].user.as_deref(), Some("a"));
        assert_eq!(result[0].severity, Severity::High);
        assert_eq!(result[1].user.as_deref(), Some("b"));
        assert_eq!(result[2].category, Category::SuspiciousLogin);
    }

    #[test]
    fn absent_fields_use_placeholder() {
        let f = finding(Severity::High, Category::CredentialAccess, None, None);
        let key = AggregationKey::of(&f);
        assert_eq!(key.user, "None");
        assert_eq!(key.ip, "None");
        assert_eq!(key.category, "Credential Access");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(Vec::new()).is_empty());
        assert!(FindingAggregator::new().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn severity() -> impl Strategy<Value = Severity> {
            prop::sample::select(Severity::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn one_finding_per_key_with_max_severity(
                items in prop::collection::vec((severity(), 0usize..3, 0usize..3), 0..64)
            ) {
                let users = ["alice", "bob", "carol"];
                let findings: Vec<_> = items
                    .iter()
                    .map(|&(sev, u, i)| {
                        finding(sev, Category::BruteForce, Some(users[u]), Some(users[i]))
                    })
                    .collect();
                let result = aggregate(findings.clone());

                for survivor in &result {
                    let key = AggregationKey::of(survivor);
                    let max = findings
                        .iter()
                        .filter(|f| AggregationKey::of(f) == key)
                        .map(|f| f.severity)
                        .max();
                    prop_assert_eq!(Some(survivor.severity), max);
                }

                let mut keys: Vec<_> = result.iter().map(AggregationKey::of).collect();
                let total = keys.len();
                keys.sort_by(|a, b| (&a.user, &a.ip).cmp(&(&b.user, &b.ip)));
                keys.dedup();
                prop_assert_eq!(keys.len(), total);
            }
        }
    }
}
