//! 파이프라인 trait -- 외부 협력자 확장 포인트 정의

use crate::error::ThreatlensError;
use crate::types::{Advice, IncidentSummary, LogEntry};

/// 로그 정규화기 trait
///
/// 새로운 로그 형식을 지원하려면 이 trait을 구현합니다.
/// 해석할 수 없는 레코드는 건너뛰거나 에러로 보고해야 하며,
/// 엔진에는 잘 정의된 [`LogEntry`]만 전달됩니다.
pub trait LogNormalizer: Send + Sync {
    /// 지원하는 로그 형식 이름
    fn format_name(&self) -> &str;

    /// 원시 바이트를 정규화된 로그 엔트리 목록으로 변환
    fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError>;
}

/// 완화 권고 협력자 trait
///
/// 입력은 인시던트 요약, 출력은 자유 텍스트 권고뿐입니다.
/// 심각도, 카테고리, 기법 매핑에는 접근할 수 없습니다.
pub trait Advisor: Send + Sync {
    /// 협력자 이름
    fn name(&self) -> &str;

    /// 요약을 받아 권고를 생성
    fn advise(&self, summary: &IncidentSummary) -> Result<Advice, ThreatlensError>;
}
