#![no_main]

use libfuzzer_sys::fuzz_target;
use tapflow_core::record::Record;
use tapflow_stream_processor::{Dispatcher, StreamConfig, Toolset};

const TOPICS: [&str; 5] = ["events", "logs", "metrics", "audit", "inventory"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(payload) else {
        return;
    };

    let (tools, _cache, _sink) = Toolset::in_memory();
    let Ok(dispatcher) = Dispatcher::from_config(&StreamConfig::default(), tools) else {
        return;
    };
    let topic = TOPICS[usize::from(selector) % TOPICS.len()];

    // 어떤 레코드든 디스패치는 보고서를 반환해야 함
    assert!(dispatcher.dispatch(topic, &Record::new(value)).is_some());
});
