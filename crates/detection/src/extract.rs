//! 메시지 필드 추출 헬퍼
//!
//! 모든 헬퍼는 실패하지 않습니다. 패턴이 없으면 센티널 [`UNKNOWN`]을 반환합니다.

use std::sync::LazyLock;

use regex::Regex;
use threatlens_core::types::UNKNOWN;

static IPV4_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+\.\d+)").expect("IPV4_REGEX pattern is valid"));

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"for (\w+)").expect("USERNAME_REGEX pattern is valid"));

static SUDO_USER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+)\s*:").expect("SUDO_USER_REGEX pattern is valid"));

/// 메시지에서 첫 번째 dotted-quad 주소를 추출합니다.
///
/// 옥텟 범위는 검증하지 않습니다.
pub fn extract_ip(message: &str) -> &str {
    first_capture(&IPV4_REGEX, message)
}

/// `"for <word>"` 뒤의 첫 단어를 사용자로 추출합니다.
///
/// `"Failed password for invalid user bob"` 같은 메시지는 `invalid`를 반환합니다.
pub fn extract_username(message: &str) -> &str {
    first_capture(&USERNAME_REGEX, message)
}

/// sudo 메시지 앞머리의 `user :` 토큰을 추출합니다.
pub fn extract_sudo_user(message: &str) -> &str {
    first_capture(&SUDO_USER_REGEX, message)
}

fn first_capture<'a>(regex: &Regex, message: &'a str) -> &'a str {
    regex
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map_or(UNKNOWN, |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ip_from_failed_password() {
        let msg = "Failed password for admin from 1.2.3.4 port 22 ssh2";
        assert_eq!(extract_ip(msg), "1.2.3.4");
        assert_eq!(extract_username(msg), "admin");
    }

    #[test]
    fn first_ip_wins() {
        assert_eq!(extract_ip("from 10.0.0.1 via 10.0.0.2"), "10.0.0.1");
    }

    #[test]
    fn missing_patterns_degrade_to_unknown() {
        assert_eq!(extract_ip("no address here"), UNKNOWN);
        assert_eq!(extract_username("nobody logged in"), UNKNOWN);
        assert_eq!(extract_sudo_user("COMMAND=/bin/ls"), UNKNOWN);
    }

    #[test]
    fn invalid_user_yields_literal_word() {
        let msg = "Failed password for invalid user bob from 5.6.7.8 port 4242 ssh2";
        assert_eq!(extract_username(msg), "invalid");
    }

    #[test]
    fn sudo_user_is_leading_token() {
        let msg = "  alice : TTY=pts/0 ; PWD=/home/alice ; USER=root ; COMMAND=/bin/bash";
        assert_eq!(extract_sudo_user(msg), "alice");
    }

    #[test]
    fn out_of_range_octets_still_match() {
        assert_eq!(extract_ip("from 999.1.1.1"), "999.1.1.1");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn extractors_never_panic(msg in ".{0,512}") {
                let _ = extract_ip(&msg);
                let _ = extract_username(&msg);
                let _ = extract_sudo_user(&msg);
            }

            #[test]
            fn extracted_ip_is_substring_or_unknown(msg in "[a-z0-9. ]{0,128}") {
                let ip = extract_ip(&msg);
                prop_assert!(ip == UNKNOWN || msg.contains(ip));
            }

            #[test]
            fn embedded_ip_is_found(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
                let ip = format!("{a}.{b}.{c}.{d}");
                let msg = format!("Failed password for root from {ip} port 22 ssh2");
                prop_assert_eq!(extract_ip(&msg), ip.as_str());
                prop_assert_eq!(extract_username(&msg), "root");
            }
        }
    }
}
