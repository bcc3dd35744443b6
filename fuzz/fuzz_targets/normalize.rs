#![no_main]

use libfuzzer_sys::fuzz_target;
use tapflow_core::diagnostics::Diagnostics;
use tapflow_stream_processor::{normalize_ip, normalize_mac};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut diag = Diagnostics::new();

    if let Some(ip) = normalize_ip(input, &mut diag) {
        // 정규화 결과는 다시 정규화해도 바뀌지 않아야 함
        assert_eq!(normalize_ip(&ip, &mut diag).as_deref(), Some(ip.as_str()));
    }
    if let Some(mac) = normalize_mac(input, &mut diag) {
        assert_eq!(mac.len(), 17);
        assert_eq!(normalize_mac(&mac, &mut diag).as_deref(), Some(mac.as_str()));
    }
});
