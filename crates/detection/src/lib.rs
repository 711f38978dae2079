#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`extract`]: 메시지에서 IP / 사용자 추출 (실패 시 "unknown")
//! - [`rule`]: 소스별 우선순위 규칙과 [`RULE_CATALOG`]
//! - [`engine`]: [`DetectionEngine`]과 호출자 소유 [`DetectionState`]
//! - [`aggregate`]: (category, user, ip) 키 기반 [`FindingAggregator`]
//! - [`mitre`]: [`TechniqueRegistry`]와 [`TechniqueMapper`]
//! - [`parser`]: 형식별 정규화기와 자동 감지 [`NormalizerRouter`]
//! - [`summary`]: advisory 입력용 인시던트 요약
//! - [`advisory`]: 완화 권고 협력자와 fallback
//! - [`report`]: KPI, 상위 IP, 시간 버킷 통계
//! - [`error`]: 도메인 에러 타입

pub mod advisory;
pub mod aggregate;
pub mod engine;
pub mod error;
pub mod extract;
pub mod mitre;
pub mod parser;
pub mod report;
pub mod rule;
pub mod summary;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{DetectionEngine, DetectionState, analyze_batch};

// 집계
pub use aggregate::{AggregationKey, FindingAggregator, aggregate};

// 기법 매핑
pub use mitre::{Technique, TechniqueMapper, TechniqueRegistry, UNKNOWN_TECHNIQUE};

// 규칙
pub use rule::{RULE_CATALOG, RuleDescriptor};

// 정규화기
pub use parser::{
    CloudTrailParser, LinuxAuthParser, LogFormat, NormalizerRouter, RecordParser,
    WindowsEventParser,
};

// advisory / 리포트
pub use advisory::{AdvisoryService, FallbackAdvisor};
pub use report::FindingStats;
pub use summary::summarize;

// 에러
pub use error::DetectionPipelineError;
