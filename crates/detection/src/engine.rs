//! 탐지 엔진 -- 소스 디스패치와 교차 엔트리 상태
//!
//! [`DetectionEngine`]은 정규화된 [`LogEntry`]를 한 건씩 평가하여
//! 엔트리당 최대 하나의 원시 [`Finding`]을 만듭니다.
//!
//! # 상태
//! [`DetectionState`]는 `"<user>:<ip>"` 키의 실패 시도 카운터와
//! 비밀번호 로그인이 관측된 IP 집합으로 구성됩니다. 엔진 인스턴스마다
//! 하나씩 존재하며, 변경에는 `&mut` 접근이 필요합니다.
//!
//! # 사용 예시
//! ```ignore
//! // 배치마다 새 엔진 (권장)
//! let findings = analyze_batch(&entries, &TechniqueMapper::new());
//!
//! // 장기 상관 분석: 호출자가 직렬화
//! let engine = std::sync::Mutex::new(DetectionEngine::new());
//! let raw = engine.lock()?.evaluate(&entry);
//! ```

use std::collections::{HashMap, HashSet};

use metrics::counter;
use threatlens_core::config::DetectionConfig;
use threatlens_core::metrics as m;
use threatlens_core::types::{AnnotatedFinding, Finding, LogEntry};
use tracing::{debug, warn};

use crate::aggregate::FindingAggregator;
use crate::mitre::TechniqueMapper;
use crate::rule::{cloud_audit, host_auth, windows};

/// 상태 항목 기본 상한
const DEFAULT_MAX_TRACKED_KEYS: usize = 100_000;

/// 탐지 상태 -- 엔진의 유일한 가변 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionState {
    /// `"<user>:<ip>"` -> 누적 실패 횟수
    failed_attempts: HashMap<String, u32>,
    /// 성공 로그인이 관측된 IP
    seen_ips: HashSet<String>,
    /// 두 맵 합계의 최대 항목 수
    max_tracked_keys: usize,
}

impl DetectionState {
    /// 빈 상태를 생성합니다.
    pub fn new() -> Self {
        Self {
            failed_attempts: HashMap::new(),
            seen_ips: HashSet::new(),
            max_tracked_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }

    /// 최대 추적 항목 수를 설정합니다.
    pub fn with_max_tracked_keys(mut self, max: usize) -> Self {
        self.max_tracked_keys = max;
        self
    }

    /// 실패를 기록하고 해당 키의 누적 횟수를 반환합니다.
    pub fn record_failure(&mut self, user: &str, ip: &str) -> u32 {
        let count = self
            .failed_attempts
            .entry(failure_key(user, ip))
            .or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// 성공 로그인을 기록합니다. 처음 보는 IP이면 `true`를 반환합니다.
    pub fn observe_login(&mut self, ip: &str) -> bool {
        self.seen_ips.insert(ip.to_owned())
    }

    /// 특정 (user, ip)의 누적 실패 횟수
    pub fn failed_attempts(&self, user: &str, ip: &str) -> u32 {
        self.failed_attempts
            .get(&failure_key(user, ip))
            .copied()
            .unwrap_or(0)
    }

    /// IP가 이미 관측되었는지 여부
    pub fn has_seen(&self, ip: &str) -> bool {
        self.seen_ips.contains(ip)
    }

    /// 현재 추적 중인 항목 수 (카운터 + 관측 IP)
    pub fn tracked_keys(&self) -> usize {
        self.failed_attempts.len() + self.seen_ips.len()
    }

    /// 최대 추적 항목 수
    pub fn max_tracked_keys(&self) -> usize {
        self.max_tracked_keys
    }

    /// 상태의 메모리 성장을 제한합니다.
    ///
    /// 상한을 넘으면 모든 항목을 비웁니다.
    fn enforce_limits(&mut self) {
        let tracked = self.tracked_keys();
        if tracked > self.max_tracked_keys {
            warn!(
                count = tracked,
                max = self.max_tracked_keys,
                "detection state limit exceeded, clearing all"
            );
            self.failed_attempts.clear();
            self.seen_ips.clear();
            counter!(m::DETECTION_STATE_RESETS_TOTAL).increment(1);
        }
    }
}

impl Default for DetectionState {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_key(user: &str, ip: &str) -> String {
    format!("{user}:{ip}")
}

/// 탐지 엔진
///
/// 상태를 소유하며, 같은 인스턴스로 평가한 엔트리끼리만 카운터가 공유됩니다.
#[derive(Debug, Default)]
pub struct DetectionEngine {
    state: DetectionState,
}

impl DetectionEngine {
    /// 새 엔진을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정으로 엔진을 생성합니다.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::with_state(DetectionState::new().with_max_tracked_keys(config.max_tracked_keys))
    }

    /// 기존 상태를 이어받아 엔진을 생성합니다.
    pub fn with_state(state: DetectionState) -> Self {
        Self { state }
    }

    /// 엔트리 하나를 평가하여 원시 탐지 결과를 반환합니다.
    pub fn evaluate(&mut self, entry: &LogEntry) -> Option<Finding> {
        Self::evaluate_with(&mut self.state, entry)
    }

    /// 호출자 소유 상태로 엔트리 하나를 평가합니다.
    pub fn evaluate_with(state: &mut DetectionState, entry: &LogEntry) -> Option<Finding> {
        let finding = match entry {
            LogEntry::HostAuth(e) => host_auth::evaluate(state, e, entry),
            LogEntry::Windows(e) => windows::evaluate(e, entry),
            LogEntry::CloudAudit(e) => cloud_audit::evaluate(e, entry),
        };

        counter!(m::DETECTION_ENTRIES_ANALYZED_TOTAL, m::LABEL_SOURCE => entry.source().as_str())
            .increment(1);
        state.enforce_limits();

        let finding = finding?.with_timestamp(entry.timestamp());
        counter!(
            m::DETECTION_RAW_FINDINGS_TOTAL,
            m::LABEL_SEVERITY => finding.severity.as_str(),
            m::LABEL_CATEGORY => finding.category.to_string()
        )
        .increment(1);
        debug!(
            source = %entry.source(),
            severity = %finding.severity,
            category = %finding.category,
            "rule matched"
        );

        Some(finding)
    }

    /// 엔트리 시퀀스를 평가하고 배치 내에서 집계합니다.
    ///
    /// 상태는 호출 간에 유지됩니다.
    pub fn analyze<'a, I>(&mut self, entries: I) -> Vec<Finding>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut aggregator = FindingAggregator::new();
        for entry in entries {
            if let Some(finding) = self.evaluate(entry) {
                aggregator.push(finding);
            }
        }
        aggregator.finish()
    }

    /// 현재 상태 참조
    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    /// 엔진을 소비하고 상태를 반환합니다.
    pub fn into_state(self) -> DetectionState {
        self.state
    }
}

/// 새 엔진으로 배치 하나를 분석하고 기법을 매핑합니다.
///
/// 배치 간에 카운터가 공유되지 않습니다.
pub fn analyze_batch(entries: &[LogEntry], mapper: &TechniqueMapper) -> Vec<AnnotatedFinding> {
    analyze_batch_with(entries, mapper, &DetectionConfig::default())
}

/// 설정을 적용해 새 엔진으로 배치를 분석합니다.
pub fn analyze_batch_with(
    entries: &[LogEntry],
    mapper: &TechniqueMapper,
    config: &DetectionConfig,
) -> Vec<AnnotatedFinding> {
    let mut engine = DetectionEngine::from_config(config);
    let findings = engine.analyze(entries);
    debug!(
        entries = entries.len(),
        findings = findings.len(),
        "batch analyzed"
    );
    mapper.map_all(findings)
}
