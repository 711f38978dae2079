//! 완화 권고 -- 외부 advisory 협력자 경계
//!
//! 협력자는 [`IncidentSummary`]만 받고 [`Advice`] 텍스트만 돌려줍니다.
//! 탐지 결과에는 접근하지 않으므로 심각도, 카테고리, 기법 매핑을 바꿀 수 없습니다.
//! 협력자 실패는 [`AdvisoryService`]에서 고정 fallback 응답으로 대체됩니다.

use metrics::counter;
use threatlens_core::error::{AdvisoryError, ThreatlensError};
use threatlens_core::metrics as m;
use threatlens_core::pipeline::Advisor;
use threatlens_core::types::{Advice, AnnotatedFinding, IncidentSummary};
use tracing::{debug, warn};

use crate::summary::summarize;

/// 언어 모델 협력자에게 주는 시스템 지시문
pub const SYSTEM_PROMPT: &str = "You are a senior SOC security advisor.

Rules:
- You DO NOT perform threat detection.
- You DO NOT change severity or MITRE mapping.
- You ONLY provide mitigation and prevention advice.
- Be concise, actionable, and realistic.
- Respond ONLY with valid JSON.";

/// 요약을 사용자 프롬프트로 렌더링합니다.
pub fn build_prompt(summary: &IncidentSummary) -> Result<String, ThreatlensError> {
    let rendered = serde_json::to_string_pretty(summary)
        .map_err(|e| AdvisoryError::InvalidResponse(e.to_string()))?;
    Ok(format!(
        "Given the following security incident summary, provide mitigation guidance.

Return JSON in EXACTLY this format:

{{
  \"risk_summary\": \"\",
  \"immediate_actions\": [],
  \"preventive_controls\": [],
  \"priority\": \"\"
}}

Incident summary:
{rendered}
"
    ))
}

/// 협력자 응답 텍스트를 [`Advice`]로 해석합니다.
///
/// 응답이 Markdown 코드 펜스로 시작하면 본문 안의 모든 펜스
/// (```` ```json ````, ```` ``` ````)를 제거합니다.
pub fn parse_advice(text: &str) -> Result<Advice, AdvisoryError> {
    let trimmed = text.trim();
    let body = if trimmed.starts_with("```") {
        trimmed.replace("```json", "").replace("```", "")
    } else {
        trimmed.to_owned()
    };
    serde_json::from_str(body.trim()).map_err(|e| AdvisoryError::InvalidResponse(e.to_string()))
}

/// 항상 고정 권고를 돌려주는 협력자
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAdvisor;

impl Advisor for FallbackAdvisor {
    fn name(&self) -> &str {
        "fallback"
    }

    fn advise(&self, _summary: &IncidentSummary) -> Result<Advice, ThreatlensError> {
        Ok(Advice::fallback())
    }
}

/// 프롬프트 기반 협력자 어댑터
///
/// `complete(system, user)`가 모델 응답 텍스트를 돌려주면
/// [`parse_advice`]로 해석합니다. 전송 계층은 호출자가 제공합니다.
pub struct PromptAdvisor<F> {
    name: String,
    complete: F,
}

impl<F> PromptAdvisor<F>
where
    F: Fn(&str, &str) -> Result<String, AdvisoryError> + Send + Sync,
{
    /// 새 어댑터를 생성합니다.
    pub fn new(name: impl Into<String>, complete: F) -> Self {
        Self {
            name: name.into(),
            complete,
        }
    }
}

impl<F> Advisor for PromptAdvisor<F>
where
    F: Fn(&str, &str) -> Result<String, AdvisoryError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn advise(&self, summary: &IncidentSummary) -> Result<Advice, ThreatlensError> {
        let prompt = build_prompt(summary)?;
        let text = (self.complete)(SYSTEM_PROMPT, &prompt)?;
        Ok(parse_advice(&text)?)
    }
}

/// advisory 서비스 -- 실패를 fallback으로 흡수
pub struct AdvisoryService {
    advisor: Box<dyn Advisor>,
}

impl AdvisoryService {
    /// 협력자로 서비스를 생성합니다.
    pub fn new(advisor: Box<dyn Advisor>) -> Self {
        Self { advisor }
    }

    /// 협력자 이름
    pub fn advisor_name(&self) -> &str {
        self.advisor.name()
    }

    /// 탐지 결과 목록에 대한 권고를 생성합니다. 실패하지 않습니다.
    pub fn recommend(&self, findings: &[AnnotatedFinding]) -> Advice {
        self.recommend_for(&summarize(findings))
    }

    /// 요약에 대한 권고를 생성합니다. 실패하지 않습니다.
    pub fn recommend_for(&self, summary: &IncidentSummary) -> Advice {
        match self.advisor.advise(summary) {
            Ok(advice) => {
                debug!(advisor = self.advisor.name(), "advice generated");
                advice
            }
            Err(e) => {
                warn!(advisor = self.advisor.name(), error = %e, "advisor failed, using fallback");
                counter!(m::ADVISORY_FALLBACK_TOTAL).increment(1);
                Advice::fallback()
            }
        }
    }
}

impl Default for AdvisoryService {
    fn default() -> Self {
        Self::new(Box::new(FallbackAdvisor))
    }
}
