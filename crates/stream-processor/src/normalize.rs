//! 네트워크 식별자 정규화 -- IP/MAC 주소의 정규 표기
//!
//! 두 함수 모두 순수 함수이며, 실패 시 추측하지 않고 `None`과 함께
//! 노트를 정확히 한 건 남깁니다.
//!
//! - IPv4: 점 표기 (`10.0.0.1`)
//! - IPv6: RFC 5952 압축 표기 (`2001:db8::1`)
//! - MAC: 소문자, 콜론 구분 (`aa:bb:cc:dd:ee:ff`)

use std::net::IpAddr;

use serde_json::{Value, json};
use tapflow_core::diagnostics::Diagnostics;

/// MAC 주소의 16진수 자릿수
const MAC_HEX_DIGITS: usize = 12;

/// IP 주소를 정규 표기로 변환합니다.
pub fn normalize_ip(input: &str, diag: &mut Diagnostics) -> Option<String> {
    match input.trim().parse::<IpAddr>() {
        Ok(addr) => Some(addr.to_string()),
        Err(_) => {
            diag.note(format!("Cannot parse IP address: {input:?}"));
            None
        }
    }
}

/// JSON 값으로 주어진 IP 주소를 정규화합니다. 문자열이 아니면 실패합니다.
pub fn normalize_ip_value(input: &Value, diag: &mut Diagnostics) -> Option<String> {
    match input {
        Value::String(s) => normalize_ip(s, diag),
        other => {
            diag.note(format!("Cannot parse IP address: {other}"));
            None
        }
    }
}

/// MAC 주소를 `aa:bb:cc:dd:ee:ff` 형식으로 변환합니다.
///
/// 16진수가 아닌 모든 문자(구분자 포함)를 제거한 뒤 정확히 12자리가 남아야 합니다.
pub fn normalize_mac(input: &str, diag: &mut Diagnostics) -> Option<String> {
    let hex: Vec<char> = input
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if hex.len() != MAC_HEX_DIGITS {
        diag.note_with("Invalid MAC address", json!({ "mac": input }));
        return None;
    }

    let octets: Vec<String> = hex.chunks(2).map(|pair| pair.iter().collect()).collect();
    Some(octets.join(":"))
}

/// JSON 값으로 주어진 MAC 주소를 정규화합니다. 문자열이 아니면 실패합니다.
pub fn normalize_mac_value(input: &Value, diag: &mut Diagnostics) -> Option<String> {
    match input {
        Value::String(s) => normalize_mac(s, diag),
        other => {
            diag.note_with("Invalid MAC address", json!({ "mac": other }));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ip(input: &str) -> (Option<String>, usize) {
        let mut diag = Diagnostics::new();
        let out = normalize_ip(input, &mut diag);
        (out, diag.len())
    }

    fn mac(input: &str) -> (Option<String>, usize) {
        let mut diag = Diagnostics::new();
        let out = normalize_mac(input, &mut diag);
        (out, diag.len())
    }

    #[test]
    fn ipv4_dotted_form() {
        assert_eq!(ip("10.0.0.1"), (Some("10.0.0.1".to_owned()), 0));
        assert_eq!(ip("  192.168.1.20 "), (Some("192.168.1.20".to_owned()), 0));
    }

    #[test]
    fn ipv6_is_compressed() {
        assert_eq!(
            ip("2001:0db8:0000:0000:0000:0000:0000:0001").0.as_deref(),
            Some("2001:db8::1")
        );
        assert_eq!(ip("FE80:0:0:0:0:0:0:1").0.as_deref(), Some("fe80::1"));
        assert_eq!(ip("::").0.as_deref(), Some("::"));
    }

    #[test]
    fn invalid_ip_yields_one_note() {
        let mut diag = Diagnostics::new();
        assert_eq!(normalize_ip("10.0.0.256", &mut diag), None);
        assert_eq!(diag.len(), 1);
        assert_eq!(
            diag.notes()[0].message,
            "Cannot parse IP address: \"10.0.0.256\""
        );
    }

    #[test]
    fn non_string_ip_value_is_rejected() {
        let mut diag = Diagnostics::new();
        assert_eq!(normalize_ip_value(&json!(42), &mut diag), None);
        assert_eq!(diag.len(), 1);
        assert_eq!(
            normalize_ip_value(&json!("::1"), &mut diag).as_deref(),
            Some("::1")
        );
    }

    #[test]
    fn mac_separator_variants() {
        for input in [
            "AA-BB-CC-DD-EE-FF",
            "aa:bb:cc:dd:ee:ff",
            "aabb.ccdd.eeff",
            "AABBCCDDEEFF",
            " aa bb cc dd ee ff ",
        ] {
            assert_eq!(
                mac(input),
                (Some("aa:bb:cc:dd:ee:ff".to_owned()), 0),
                "input {input}"
            );
        }
    }

    #[test]
    fn mac_with_wrong_digit_count_yields_one_note() {
        for input in ["aa:bb:cc:dd:ee", "aa:bb:cc:dd:ee:ff:00", "", "zz:zz:zz:zz:zz:zz"] {
            let (out, notes) = mac(input);
            assert_eq!(out, None, "input {input}");
            assert_eq!(notes, 1, "input {input}");
        }
    }

    #[test]
    fn invalid_mac_note_carries_input() {
        let mut diag = Diagnostics::new();
        normalize_mac("nope", &mut diag);
        let note = &diag.notes()[0];
        assert_eq!(note.message, "Invalid MAC address");
        assert_eq!(note.context, Some(json!({ "mac": "nope" })));
    }

    proptest! {
        #[test]
        fn ipv4_normalization_is_idempotent(a: u8, b: u8, c: u8, d: u8) {
            let raw = format!("{a}.{b}.{c}.{d}");
            let (first, _) = ip(&raw);
            let first = first.unwrap();
            let (second, notes) = ip(&first);
            prop_assert_eq!(second.as_deref(), Some(first.as_str()));
            prop_assert_eq!(notes, 0);
        }

        #[test]
        fn ipv6_normalization_is_idempotent(segments: [u16; 8]) {
            let raw = segments
                .iter()
                .map(|s| format!("{s:X}"))
                .collect::<Vec<_>>()
                .join(":");
            let first = ip(&raw).0.unwrap();
            prop_assert_eq!(ip(&first).0, Some(first.clone()));
        }

        #[test]
        fn mac_any_case_and_separator(bytes: [u8; 6], sep in "[-:. ]?", upper: bool) {
            let expected = bytes
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(":");
            let raw = bytes
                .iter()
                .map(|b| if upper { format!("{b:02X}") } else { format!("{b:02x}") })
                .collect::<Vec<_>>()
                .join(sep.as_str());
            prop_assert_eq!(mac(&raw), (Some(expected), 0));
        }

        #[test]
        fn mac_never_panics_and_notes_at_most_once(raw in ".{0,40}") {
            let (out, notes) = mac(&raw);
            prop_assert!(notes <= 1);
            prop_assert_eq!(out.is_none(), notes == 1);
        }
    }
}
