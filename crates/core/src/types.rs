//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 외부 정규화기가 만들어내는 [`LogEntry`], 탐지 엔진이 생성하는 [`Finding`],
//! 기법 매퍼가 주석을 붙인 [`AnnotatedFinding`], 그리고 advisory 협력자와
//! 주고받는 [`IncidentSummary`] / [`Advice`]를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Low < Medium < High`).
/// 집계와 하위 정렬 모두 이 순서를 사용합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
}

impl Severity {
    /// 모든 심각도 (오름차순)
    pub const ALL: [Severity; 4] = [Self::Info, Self::Low, Self::Medium, Self::High];

    /// 순위 값 (`info=1, low=2, medium=3, high=4`)
    pub fn rank(self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
        }
    }

    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// 소문자 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 탐지 카테고리
///
/// 집계 키와 기법 조회 키를 동시에 결정하는 고정 어휘입니다.
/// 레지스트리에 없는 라벨은 `Other`로 표현되며 T0000으로 매핑됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    BruteForce,
    SuspiciousLogin,
    LateralMovement,
    PrivilegeEscalation,
    Persistence,
    CredentialAccess,
    ProcessCreation,
    IamMisuse,
    Reconnaissance,
    /// 고정 어휘 밖의 라벨
    Other(String),
}

impl Category {
    /// 고정 어휘에 속한 카테고리 목록
    pub const KNOWN: [Category; 9] = [
        Self::BruteForce,
        Self::SuspiciousLogin,
        Self::LateralMovement,
        Self::PrivilegeEscalation,
        Self::Persistence,
        Self::CredentialAccess,
        Self::ProcessCreation,
        Self::IamMisuse,
        Self::Reconnaissance,
    ];

    /// 표시 이름 ("Brute Force" 등)
    pub fn as_str(&self) -> &str {
        match self {
            Self::BruteForce => "Brute Force",
            Self::SuspiciousLogin => "Suspicious Login",
            Self::LateralMovement => "Lateral Movement",
            Self::PrivilegeEscalation => "Privilege Escalation",
            Self::Persistence => "Persistence",
            Self::CredentialAccess => "Credential Access",
            Self::ProcessCreation => "Process Creation",
            Self::IamMisuse => "IAM Misuse",
            Self::Reconnaissance => "Reconnaissance",
            Self::Other(name) => name,
        }
    }

    /// 표시 이름에서 카테고리를 만듭니다. 모르는 이름은 `Other`가 됩니다.
    pub fn from_name(name: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|c| c.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_owned()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// 로그 소스 판별자
///
/// 정규화 시점에 결정되며, 엔진은 이 값으로 규칙 세트를 선택합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// 호스트 인증 로그 (auth.log, secure)
    HostAuth,
    /// Windows 보안 이벤트
    Windows,
    /// 클라우드 API 감사 로그 (CloudTrail)
    CloudAudit,
}

impl LogSource {
    /// 전체 소스 목록
    pub const ALL: [LogSource; 3] = [Self::HostAuth, Self::Windows, Self::CloudAudit];

    /// snake_case 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostAuth => "host_auth",
            Self::Windows => "windows",
            Self::CloudAudit => "cloud_audit",
        }
    }

    /// 문자열에서 소스를 파싱합니다. 흔한 별칭도 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "host_auth" | "host-auth" | "linux" | "auth" => Some(Self::HostAuth),
            "windows" | "win" => Some(Self::Windows),
            "cloud_audit" | "cloud-audit" | "cloudtrail" | "cloud" => Some(Self::CloudAudit),
            _ => None,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 정규화된 로그 엔트리
///
/// 엔진이 소비하는 유일한 입력 형태입니다. `source` 태그로 구분되는
/// tagged union이므로 소스 판별을 필드 존재 여부로 반복 추론하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LogEntry {
    /// 호스트 인증 로그
    HostAuth(HostAuthEntry),
    /// Windows 보안 이벤트
    Windows(WindowsEntry),
    /// 클라우드 감사 이벤트
    CloudAudit(CloudAuditEntry),
}

impl LogEntry {
    /// 소스 판별자를 반환합니다.
    pub fn source(&self) -> LogSource {
        match self {
            Self::HostAuth(_) => LogSource::HostAuth,
            Self::Windows(_) => LogSource::Windows,
            Self::CloudAudit(_) => LogSource::CloudAudit,
        }
    }

    /// 소스 고유 형식의 타임스탬프 문자열
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::HostAuth(e) => (!e.timestamp.is_empty()).then_some(e.timestamp.as_str()),
            Self::Windows(e) => e.timestamp.as_deref(),
            Self::CloudAudit(e) => e.event_time.as_deref(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostAuth(e) => write!(f, "{} {}: {}", e.host, e.process, e.message),
            Self::Windows(e) => write!(f, "event {} user={} ip={}", e.event_id, e.user, e.ip),
            Self::CloudAudit(e) => write!(f, "{} from {}", e.event_name, e.source_ip),
        }
    }
}

/// 호스트 인증 로그 엔트리
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAuthEntry {
    /// syslog 타임스탬프 (예: "Jan 10 07:32:14")
    pub timestamp: String,
    /// 호스트명
    pub host: String,
    /// 프로세스명 (pid 제외)
    pub process: String,
    /// 자유 형식 메시지
    pub message: String,
    /// 원본 라인
    pub raw: String,
}

/// Windows 보안 이벤트 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowsEntry {
    /// 이벤트 시각 (best-effort)
    #[serde(default)]
    pub timestamp: Option<String>,
    /// 이벤트 ID (4624, 4625 등)
    pub event_id: u32,
    /// 사용자 (없으면 "unknown")
    #[serde(default = "unknown")]
    pub user: String,
    /// IP 주소 (없으면 "unknown")
    #[serde(default = "unknown")]
    pub ip: String,
    /// 프로세스 경로
    #[serde(default)]
    pub process: String,
    /// 메시지
    #[serde(default)]
    pub message: String,
    /// 원본 레코드
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// 클라우드 감사 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudAuditEntry {
    /// API 이벤트 이름 (예: "GetObject")
    pub event_name: String,
    /// 이벤트 시각
    #[serde(default)]
    pub event_time: Option<String>,
    /// 호출자 IP (없으면 "unknown")
    #[serde(default = "unknown")]
    pub source_ip: String,
    /// 호출자 식별 정보
    #[serde(default)]
    pub user_identity: UserIdentity,
    /// 에러 코드
    #[serde(default)]
    pub error_code: Option<String>,
    /// 에러 메시지
    #[serde(default)]
    pub error_message: Option<String>,
    /// 원본 레코드
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// 클라우드 호출자 식별 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub principal_id: Option<String>,
}

impl UserIdentity {
    /// username → ARN → principal id 순으로 사용자를 결정합니다.
    ///
    /// 빈 문자열은 없는 것으로 취급하며, 모두 없으면 "unknown"입니다.
    pub fn resolve(&self) -> &str {
        [&self.user_name, &self.arn, &self.principal_id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
    }
}

/// 추출 실패 시 사용하는 센티널 문자열
pub const UNKNOWN: &str = "unknown";

fn unknown() -> String {
    UNKNOWN.to_owned()
}

/// 탐지 결과 (원시 또는 집계)
///
/// 하나의 규칙 매칭으로 생성됩니다. `category`와 `severity`는 항상 설정되며,
/// `user`/`ip`/`timestamp`는 추출 가능한 경우에만 존재합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// 심각도
    pub severity: Severity,
    /// 카테고리
    pub category: Category,
    /// 사람이 읽을 수 있는 설명
    pub description: String,
    /// 관련 사용자
    #[serde(default)]
    pub user: Option<String>,
    /// 관련 IP
    #[serde(default)]
    pub ip: Option<String>,
    /// 소스 고유 형식의 타임스탬프
    #[serde(default)]
    pub timestamp: Option<String>,
    /// 원본 엔트리 (리포팅용)
    pub log: LogEntry,
}

impl Finding {
    /// 필수 필드로 새 탐지 결과를 만듭니다.
    pub fn new(
        severity: Severity,
        category: Category,
        description: impl Into<String>,
        log: LogEntry,
    ) -> Self {
        Self {
            severity,
            category,
            description: description.into(),
            user: None,
            ip: None,
            timestamp: None,
            log,
        }
    }

    /// 사용자를 설정합니다.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// IP를 설정합니다.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// 타임스탬프를 설정합니다.
    pub fn with_timestamp(mut self, timestamp: Option<&str>) -> Self {
        self.timestamp = timestamp.map(str::to_owned);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity, self.category, self.description
        )
    }
}

/// 기법 식별자가 부착된 탐지 결과
///
/// 직렬화 시 `Finding` 필드와 `mitre_id`/`mitre_name`이 한 레코드로 평탄화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFinding {
    #[serde(flatten)]
    pub finding: Finding,
    /// 기법 식별자 (예: "T1110")
    pub mitre_id: String,
    /// 기법 이름
    pub mitre_name: String,
}

impl From<AnnotatedFinding> for Finding {
    fn from(annotated: AnnotatedFinding) -> Self {
        annotated.finding
    }
}

impl fmt::Display for AnnotatedFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.finding, self.mitre_id, self.mitre_name)
    }
}

/// advisory 협력자에게 전달하는 간결한 인시던트 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentSummary {
    /// 최대 심각도 (탐지 결과가 없으면 `None`)
    pub max_severity: Option<Severity>,
    /// 고유 카테고리 (정렬됨)
    pub categories: Vec<String>,
    /// 고유 기법 식별자 (정렬됨)
    pub mitre_techniques: Vec<String>,
    /// 고유 사용자 (정렬됨)
    pub affected_users: Vec<String>,
    /// 고유 IP (정렬됨)
    pub affected_ips: Vec<String>,
    /// 탐지 결과 수
    pub event_count: usize,
}

/// 완화 권고
///
/// 순수 텍스트이며 심각도, 카테고리, 기법 매핑을 바꾸지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub risk_summary: String,
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    pub preventive_controls: Vec<String>,
    #[serde(default)]
    pub priority: String,
}

impl Advice {
    /// 협력자 실패 시 사용하는 고정 권고
    pub fn fallback() -> Self {
        Self {
            risk_summary: "Unable to generate AI recommendations.".to_owned(),
            immediate_actions: vec![
                "Review affected accounts and source IPs".to_owned(),
                "Apply temporary access restrictions".to_owned(),
                "Manually assess recent activity".to_owned(),
            ],
            preventive_controls: vec![
                "Enable multi-factor authentication".to_owned(),
                "Harden privileged account access".to_owned(),
                "Improve monitoring and alerting".to_owned(),
            ],
            priority: "unknown".to_owned(),
        }
    }
}
