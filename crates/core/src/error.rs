//! 에러 타입 -- 도메인별 에러 정의
//!
//! 탐지 코어 자체는 실패 경로가 없습니다. 에러는 설정 로딩, 로그 정규화,
//! 외부 advisory 협력자에서만 발생합니다.

/// threatlens 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ThreatlensError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파싱(정규화) 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// advisory 협력자 에러
    #[error("advisory error: {0}")]
    Advisory(#[from] AdvisoryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 파싱 실패
    #[error("parse failed at offset {offset}: {reason}")]
    Failed { offset: usize, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// advisory 협력자 에러
///
/// 이 에러는 결코 탐지 결과에 영향을 주지 않으며,
/// `AdvisoryService`에서 고정된 fallback 응답으로 대체됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// 협력자 호출 실패
    #[error("advisor '{advisor}' unavailable: {reason}")]
    Unavailable { advisor: String, reason: String },

    /// 응답 형식 오류
    #[error("invalid advisory response: {0}")]
    InvalidResponse(String),
}
