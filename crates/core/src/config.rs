//! 설정 관리 -- threatlens.toml 파싱 및 런타임 설정
//!
//! [`ThreatlensConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`THREATLENS_DETECTION_MAX_TRACKED_KEYS=5000` 형식)
//! 3. 설정 파일 (`threatlens.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), threatlens_core::error::ThreatlensError> {
//! use threatlens_core::config::ThreatlensConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ThreatlensConfig::load("threatlens.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ThreatlensConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ThreatlensError};
use crate::types::Severity;

/// threatlens 통합 설정
///
/// `threatlens.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatlensConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 탐지 엔진 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// advisory 설정
    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

impl ThreatlensConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ThreatlensError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에 환경변수 오버라이드만 적용합니다.
    ///
    /// 파일이 존재하지만 잘못된 경우에는 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ThreatlensError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(ThreatlensError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ThreatlensError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ThreatlensError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ThreatlensError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ThreatlensError> {
        toml::from_str(toml_str).map_err(|e| {
            ThreatlensError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `THREATLENS_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "THREATLENS_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "THREATLENS_GENERAL_LOG_FORMAT");

        // Detection
        override_usize(
            &mut self.detection.max_tracked_keys,
            "THREATLENS_DETECTION_MAX_TRACKED_KEYS",
        );
        override_usize(
            &mut self.detection.max_input_size,
            "THREATLENS_DETECTION_MAX_INPUT_SIZE",
        );

        // Report
        override_usize(&mut self.report.top_ips, "THREATLENS_REPORT_TOP_IPS");
        override_string(
            &mut self.report.min_severity,
            "THREATLENS_REPORT_MIN_SEVERITY",
        );

        // Advisory
        override_bool(&mut self.advisory.enabled, "THREATLENS_ADVISORY_ENABLED");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ThreatlensError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.detection.max_tracked_keys == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.max_tracked_keys".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detection.max_input_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.max_input_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if Severity::from_str_loose(&self.report.min_severity).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "report.min_severity".to_owned(),
                reason: "must be one of: info, low, medium, high".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 탐지 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// 탐지 상태(실패 카운터, 관측 IP)의 최대 항목 수
    pub max_tracked_keys: usize,
    /// 정규화기가 한 번에 받는 최대 입력 크기 (바이트)
    pub max_input_size: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_tracked_keys: 100_000,
            max_input_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 상위 IP 테이블 크기
    pub top_ips: usize,
    /// 출력할 최소 심각도 (info, low, medium, high)
    pub min_severity: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_ips: 10,
            min_severity: "info".to_owned(),
        }
    }
}

/// advisory 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// 분석 결과에 완화 권고를 붙일지 여부
    pub enabled: bool,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
