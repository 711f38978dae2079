//! Linux auth.log 정규화기
//!
//! BSD syslog 스타일 라인을 호스트 인증 엔트리로 변환합니다.
//!
//! ```text
//! Jan 10 07:32:14 bastion sshd[1234]: Failed password for root from 1.2.3.4 port 22 ssh2
//! ^timestamp      ^host   ^process    ^message
//! ```
//!
//! 패턴에 맞지 않는 라인은 건너뜁니다.

use std::sync::LazyLock;

use regex::Regex;
use threatlens_core::error::ThreatlensError;
use threatlens_core::pipeline::LogNormalizer;
use threatlens_core::types::{HostAuthEntry, LogEntry};

use super::{DEFAULT_MAX_INPUT_SIZE, ensure_size, record_outcome};

static AUTH_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<timestamp>\w{3}\s+\d+\s[\d:]+)\s(?P<host>[\w\-.]+)\s(?P<process>[\w\-/]+)(?:\[\d+\])?:\s(?P<message>.+)",
    )
    .expect("AUTH_LINE_REGEX pattern is valid")
});

/// Linux 인증 로그 정규화기
pub struct LinuxAuthParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl LinuxAuthParser {
    /// 기본 설정으로 새 정규화기를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 라인 하나를 엔트리로 변환합니다.
    pub fn parse_line(line: &str) -> Option<HostAuthEntry> {
        let caps = AUTH_LINE_REGEX.captures(line)?;
        Some(HostAuthEntry {
            timestamp: caps["timestamp"].to_owned(),
            host: caps["host"].to_owned(),
            process: caps["process"].to_owned(),
            message: caps["message"].trim_end().to_owned(),
            raw: line.trim().to_owned(),
        })
    }
}

impl Default for LinuxAuthParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogNormalizer for LinuxAuthParser {
    fn format_name(&self) -> &str {
        "linux"
    }

    fn normalize(&self, raw: &[u8]) -> Result<Vec<LogEntry>, ThreatlensError> {
        ensure_size(raw, self.max_input_size)?;

        let text = String::from_utf8_lossy(raw);
        let mut entries = Vec::new();
        let mut skipped = 0;

        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match Self::parse_line(line) {
                Some(entry) => entries.push(LogEntry::HostAuth(entry)),
                None => skipped += 1,
            }
        }

        record_outcome("linux", entries.len(), skipped);
        Ok(entries)
    }
}
