#![no_main]
use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything that parses must summarize and build a payload without panicking.
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(run) = covcheck::parse::parse_results(s) else {
        return;
    };
    let base = Path::new("/repo");
    let report = covcheck::coverage::summarize(&run, base);
    if let covcheck::coverage::CoverageReport::Table(table) = report {
        let _ = table.to_markdown();
    }
    let target = covcheck::check::CheckTarget {
        name: "fuzz".to_string(),
        head_sha: "0".repeat(40),
    };
    let _ = covcheck::check::build_payload(&run, base, &target);
});
