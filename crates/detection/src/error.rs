//! 탐지 파이프라인 에러 타입
//!
//! 탐지 코어(엔진, 집계, 기법 매핑)는 실패하지 않습니다.
//! [`DetectionPipelineError`]는 정규화기 경계에서만 발생하며,
//! `From<DetectionPipelineError> for ThreatlensError` 변환으로 `?` 전파가 가능합니다.

use threatlens_core::error::{ParseError, ThreatlensError};

/// 탐지 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DetectionPipelineError {
    /// 정규화 실패
    #[error("parse error: {format} at offset {offset}: {reason}")]
    Parse {
        /// 정규화기 형식 (linux, windows, cloudtrail, records)
        format: String,
        /// 실패 위치 (바이트 오프셋 또는 라인 번호)
        offset: usize,
        /// 실패 사유
        reason: String,
    },

    /// 지원하지 않는 로그 형식
    #[error("unsupported log format: {0}")]
    UnsupportedFormat(String),

    /// 입력 크기 초과
    #[error("input too large: {size} bytes (max: {max})")]
    InputTooLarge {
        /// 입력 크기
        size: usize,
        /// 허용 최대 크기
        max: usize,
    },

    /// JSON 디코딩 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DetectionPipelineError> for ThreatlensError {
    fn from(err: DetectionPipelineError) -> Self {
        match err {
            DetectionPipelineError::Parse {
                format,
                offset,
                reason,
            } => ParseError::Failed {
                offset,
                reason: format!("{format}: {reason}"),
            }
            .into(),
            DetectionPipelineError::UnsupportedFormat(format) => {
                ParseError::UnsupportedFormat(format).into()
            }
            DetectionPipelineError::InputTooLarge { size, max } => {
                ParseError::TooLarge { size, max }.into()
            }
            DetectionPipelineError::Json(e) => ParseError::Failed {
                offset: e.column(),
                reason: e.to_string(),
            }
            .into(),
        }
    }
}
