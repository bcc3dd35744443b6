#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

use tapflow_core::record::Record;
use tapflow_stream_processor::logset;

/// 로그셋 도출에 쓰이는 필드만 구조적으로 생성
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    file_path: Option<String>,
    journald: bool,
    container: Option<String>,
    process: Option<String>,
    identifier: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let record = Record::new(json!({
        "log": { "file": { "path": input.file_path } },
        "input": { "type": if input.journald { "journald" } else { "filestream" } },
        "container": { "name": input.container },
        "journald": { "process": { "name": input.process } },
        "syslog": { "identifier": input.identifier },
    }));

    match logset::derive(&record) {
        Some(set) => {
            if let Some(path) = &input.file_path {
                assert_eq!(&set, path);
            } else {
                assert!(set.starts_with("journald."));
            }
            assert!(logset::namespace(&set).starts_with(logset::NAMESPACE_PREFIX));
        }
        None => assert!(input.file_path.is_none() && !input.journald),
    }
});
