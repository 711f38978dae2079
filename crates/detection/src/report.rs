//! 리포트 통계 -- 매핑된 탐지 결과의 표시용 집계
//!
//! KPI, 상위 IP 테이블, 시간대별 버킷을 계산합니다.
//! 순수 표시용이며 탐지 엔진에 영향을 주지 않습니다.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use threatlens_core::types::{AnnotatedFinding, Severity, UNKNOWN};

/// 시간 버킷 형식
const BUCKET_FORMAT: &str = "%Y-%m-%d %H:00";

/// 탐지 결과 통계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingStats {
    /// 전체 탐지 결과 수
    pub total: usize,
    /// 고유 IP 수 ("unknown" 제외)
    pub unique_ips: usize,
    /// 고유 사용자 수 ("unknown" 제외)
    pub unique_users: usize,
    /// 심각도별 건수 (모든 심각도 포함)
    pub by_severity: BTreeMap<Severity, usize>,
    /// 기법별 건수
    pub by_technique: BTreeMap<String, usize>,
    /// 상위 IP
    pub top_ips: Vec<IpStat>,
    /// 시간대별 건수 (오름차순)
    pub timeline: Vec<TimeBucket>,
}

/// IP별 통계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpStat {
    pub ip: String,
    pub count: usize,
    /// 가장 많이 나타난 카테고리 (동률이면 먼저 나타난 것)
    pub top_category: String,
    pub max_severity: Severity,
}

/// 시간 버킷
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    /// `"%Y-%m-%d %H:00"`
    pub bucket: String,
    pub count: usize,
}

#[derive(Default)]
struct IpAccumulator {
    count: usize,
    max_severity: Severity,
    /// 카테고리별 건수 (첫 등장 순서)
    categories: Vec<(String, usize)>,
}

impl IpAccumulator {
    fn add(&mut self, category: &str, severity: Severity) {
        self.count += 1;
        self.max_severity = self.max_severity.max(severity);
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, n)) => *n += 1,
            None => self.categories.push((category.to_owned(), 1)),
        }
    }

    fn top_category(&self) -> String {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.categories {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(c, _)| c.clone()).unwrap_or_default()
    }
}

impl FindingStats {
    /// 통계를 계산합니다. `top_n`은 상위 IP 테이블 크기입니다.
    pub fn compute(findings: &[AnnotatedFinding], top_n: usize) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_technique = BTreeMap::new();
        let mut ips: Vec<String> = Vec::new();
        let mut users: Vec<&str> = Vec::new();
        let mut ip_index: HashMap<&str, usize> = HashMap::new();
        let mut accumulators: Vec<IpAccumulator> = Vec::new();
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();

        for annotated in findings {
            let finding = &annotated.finding;
            *by_severity.entry(finding.severity).or_default() += 1;
            *by_technique.entry(annotated.mitre_id.clone()).or_default() += 1;

            if let Some(user) = known(finding.user.as_deref())
                && !users.contains(&user)
            {
                users.push(user);
            }

            if let Some(ip) = known(finding.ip.as_deref()) {
                let slot = *ip_index.entry(ip).or_insert_with(|| {
                    ips.push(ip.to_owned());
                    accumulators.push(IpAccumulator::default());
                    accumulators.len() - 1
                });
                accumulators[slot].add(finding.category.as_str(), finding.severity);
            }

            if let Some(dt) = finding_time(annotated) {
                *buckets.entry(dt.format(BUCKET_FORMAT).to_string()).or_default() += 1;
            }
        }

        let mut top_ips: Vec<IpStat> = ips
            .into_iter()
            .zip(&accumulators)
            .map(|(ip, acc)| IpStat {
                ip,
                count: acc.count,
                top_category: acc.top_category(),
                max_severity: acc.max_severity,
            })
            .collect();
        top_ips.sort_by(|a, b| {
            (b.count, b.max_severity).cmp(&(a.count, a.max_severity))
        });
        top_ips.truncate(top_n);

        Self {
            total: findings.len(),
            unique_ips: ip_index.len(),
            unique_users: users.len(),
            by_severity,
            by_technique,
            top_ips,
            timeline: buckets
                .into_iter()
                .map(|(bucket, count)| TimeBucket { bucket, count })
                .collect(),
        }
    }

    /// 특정 심각도의 건수
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

fn known(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != UNKNOWN)
}

/// 소스 고유 형식의 타임스탬프를 해석합니다.
///
/// - syslog `"Jan 10 07:32:14"` (연도 없음 → 1900년)
/// - ISO-8601 / RFC 3339 (`Z` 또는 오프셋은 벽시계 시각 그대로 사용)
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }

    let collapsed = ts.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("1900 {collapsed}"), "%Y %b %d %H:%M:%S")
    {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_local());
    }
    let naive = ts.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
}

fn finding_time(annotated: &AnnotatedFinding) -> Option<NaiveDateTime> {
    let finding = &annotated.finding;
    finding
        .log
        .timestamp()
        .or(finding.timestamp.as_deref())
        .and_then(parse_timestamp)
}

/// 시각 오름차순으로 정렬합니다. 해석할 수 없는 시각은 맨 앞에 둡니다.
pub fn sort_by_time(findings: &mut [AnnotatedFinding]) {
    findings.sort_by_cached_key(finding_time);
}

/// 최소 심각도 미만의 결과를 제거합니다.
pub fn retain_min_severity(findings: &mut Vec<AnnotatedFinding>, min: Severity) {
    findings.retain(|a| a.finding.severity >= min);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mitre::TechniqueMapper;
    use threatlens_core::types::{Category, Finding, HostAuthEntry, LogEntry, WindowsEntry};

    fn host(ts: &str, severity: Severity, category: Category, user: &str, ip: &str) -> AnnotatedFinding {
        let log = LogEntry::HostAuth(HostAuthEntry {
            timestamp: ts.to_owned(),
            ..Default::default()
        });
        let finding = Finding::new(severity, category, "x", log)
            .with_user(user)
            .with_ip(ip);
        TechniqueMapper::new().map(finding)
    }

    fn windows(ts: Option<&str>, severity: Severity) -> AnnotatedFinding {
        let log = LogEntry::Windows(WindowsEntry {
            timestamp: ts.map(str::to_owned),
            event_id: 4625,
            user: UNKNOWN.to_owned(),
            ip: UNKNOWN.to_owned(),
            process: String::new(),
            message: String::new(),
            raw: serde_json::Value::Null,
        });
        let finding = Finding::new(severity, Category::BruteForce, "x", log)
            .with_user(UNKNOWN)
            .with_ip(UNKNOWN);
        TechniqueMapper::new().map(finding)
    }

    #[test]
    fn parse_syslog_and_iso_timestamps() {
        let syslog = parse_timestamp("Jan 10 07:32:14").unwrap();
        assert_eq!(syslog.format(BUCKET_FORMAT).to_string(), "1900-01-10 07:00");

        let padded = parse_timestamp("Feb  3 23:59:59").unwrap();
        assert_eq!(padded.format(BUCKET_FORMAT).to_string(), "1900-02-03 23:00");

        let iso = parse_timestamp("2024-01-10T08:15:01Z").unwrap();
        assert_eq!(iso.format(BUCKET_FORMAT).to_string(), "2024-01-10 08:00");

        let offset = parse_timestamp("2024-01-10T08:15:01+09:00").unwrap();
        assert_eq!(offset.format(BUCKET_FORMAT).to_string(), "2024-01-10 08:00");

        let fractional = parse_timestamp("2024-01-10T08:15:01.123").unwrap();
        assert_eq!(fractional.format(BUCKET_FORMAT).to_string(), "2024-01-10 08:00");

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn kpis_exclude_unknown() {
        let findings = vec![
            host("Jan 10 07:32:14", Severity::High, Category::BruteForce, "admin", "1.2.3.4"),
            host("Jan 10 07:40:00", Severity::Low, Category::SuspiciousLogin, "bob", "1.2.3.4"),
            windows(Some("2024-01-10T08:15:01Z"), Severity::Medium),
        ];
        let stats = FindingStats::compute(&findings, 10);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.unique_ips, 1);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.severity_count(Severity::High), 1);
        assert_eq!(stats.severity_count(Severity::Medium), 1);
        assert_eq!(stats.severity_count(Severity::Info), 0);
        assert_eq!(stats.by_technique.get("T1110"), Some(&2));
    }

    #[test]
    fn top_ips_sorted_by_count_then_severity() {
        let findings = vec![
            host("", Severity::Low, Category::BruteForce, "a", "10.0.0.1"),
            host("", Severity::High, Category::BruteForce, "a", "10.0.0.2"),
            host("", Severity::Low, Category::BruteForce, "b", "10.0.0.3"),
            host("", Severity::Low, Category::SuspiciousLogin, "c", "10.0.0.3"),
            host("", Severity::Info, Category::SuspiciousLogin, "d", "10.0.0.3"),
        ];
        let stats = FindingStats::compute(&findings, 2);

        assert_eq!(stats.top_ips.len(), 2);
        assert_eq!(stats.top_ips[0].ip, "10.0.0.3");
        assert_eq!(stats.top_ips[0].count, 3);
        assert_eq!(stats.top_ips[0].top_category, "Suspicious Login");
        assert_eq!(stats.top_ips[0].max_severity, Severity::Low);
        assert_eq!(stats.top_ips[1].ip, "10.0.0.2");
    }

    #[test]
    fn top_category_tie_keeps_first_seen() {
        let findings = vec![
            host("", Severity::Low, Category::Persistence, "a", "1.1.1.1"),
            host("", Severity::Low, Category::BruteForce, "b", "1.1.1.1"),
        ];
        let stats = FindingStats::compute(&findings, 10);
        assert_eq!(stats.top_ips[0].top_category, "Persistence");
    }

    #[test]
    fn timeline_buckets_by_hour() {
        let findings = vec![
            host("Jan 10 07:32:14", Severity::Low, Category::BruteForce, "a", "1.1.1.1"),
            host("Jan 10 07:59:59", Severity::Low, Category::BruteForce, "b", "1.1.1.1"),
            windows(Some("2024-01-10T08:15:01Z"), Severity::Medium),
            windows(None, Severity::Medium),
        ];
        let stats = FindingStats::compute(&findings, 10);
        assert_eq!(
            stats.timeline,
            vec![
                TimeBucket { bucket: "1900-01-10 07:00".to_owned(), count: 2 },
                TimeBucket { bucket: "2024-01-10 08:00".to_owned(), count: 1 },
            ]
        );
    }

    #[test]
    fn sort_by_time_puts_unparseable_first() {
        let mut findings = vec![
            windows(Some("2024-01-10T08:15:01Z"), Severity::Low),
            host("Jan 10 07:32:14", Severity::Low, Category::BruteForce, "a", "1.1.1.1"),
            windows(None, Severity::High),
        ];
        sort_by_time(&mut findings);
        assert_eq!(findings[0].finding.severity, Severity::High);
        assert!(matches!(findings[1].finding.log, LogEntry::HostAuth(_)));
    }

    #[test]
    fn retain_min_severity_filters() {
        let mut findings = vec![
            host("", Severity::Info, Category::SuspiciousLogin, "a", "1.1.1.1"),
            host("", Severity::Medium, Category::BruteForce, "a", "1.1.1.1"),
            host("", Severity::High, Category::CredentialAccess, "a", "1.1.1.1"),
        ];
        retain_min_severity(&mut findings, Severity::Medium);
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn stats_serialize_severity_keys_lowercase() {
        let stats = FindingStats::compute(&[], 10);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["by_severity"]["high"], 0);
        assert_eq!(value["total"], 0);
    }
}
