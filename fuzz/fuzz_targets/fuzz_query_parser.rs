#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Arbitrary text must parse or fail with an error, never panic
    match msql::query::parse(text) {
        Ok(query) => {
            let _ = query.has_variable();
        }
        Err(e) => {
            let _ = e.to_string();
        }
    }
});
