#![no_main]

use libfuzzer_sys::fuzz_target;
use hexalab_sbom_scanner::parse_report;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = parse_report(data, "fuzz/cve_report.json") {
        let expected = doc.len();
        assert_eq!(doc.into_records().len(), expected);
    }
});
