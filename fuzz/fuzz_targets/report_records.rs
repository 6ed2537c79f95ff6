#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value, json};

use hexalab_sbom_scanner::parse_report;

/// 퍼저용 구조적 매칭 입력 (`None`은 필드 생략, `Some(None)`은 `null`)
#[derive(Arbitrary, Debug)]
struct FuzzMatch {
    id: Option<Option<String>>,
    severity: Option<Option<String>>,
    data_source: Option<Option<String>>,
    url: Option<Option<String>>,
    name: Option<Option<String>>,
    version: Option<Option<String>>,
}

fn put(obj: &mut Map<String, Value>, key: &str, field: &Option<Option<String>>) {
    match field {
        None => {}
        Some(None) => {
            obj.insert(key.to_owned(), Value::Null);
        }
        Some(Some(s)) => {
            obj.insert(key.to_owned(), Value::String(s.clone()));
        }
    }
}

fuzz_target!(|input: Vec<FuzzMatch>| {
    let matches: Vec<Value> = input
        .iter()
        .take(100)
        .map(|m| {
            let mut vulnerability = Map::new();
            put(&mut vulnerability, "id", &m.id);
            put(&mut vulnerability, "severity", &m.severity);
            put(&mut vulnerability, "dataSource", &m.data_source);
            put(&mut vulnerability, "url", &m.url);

            let mut artifact = Map::new();
            put(&mut artifact, "name", &m.name);
            put(&mut artifact, "version", &m.version);

            json!({ "vulnerability": vulnerability, "artifact": artifact })
        })
        .collect();
    let bytes = serde_json::to_vec(&json!({ "matches": matches })).expect("report must serialize");

    // 형식이 맞는 리포트는 항상 파싱되어야 하고, 매칭 하나당 레코드 하나
    let doc = parse_report(&bytes, "fuzz/cve_report.json").expect("well-formed report must parse");
    let records = doc.into_records();
    assert_eq!(records.len(), matches.len());

    for (record, m) in records.iter().zip(input.iter()) {
        let expected_id = m.id.clone().flatten().unwrap_or_default();
        assert_eq!(record.id, expected_id);
        if let Some(url) = &record.url {
            assert!(!url.is_empty(), "empty references are never selected");
        }
    }
});
