#![no_main]

use glyphmine::config::LinearizerConfig;
use glyphmine::pipeline::ImageInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary JSON must either be rejected or lay out without panicking
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(input) = ImageInput::from_json_str(text) {
            let _ = input.layout(&LinearizerConfig::default());
        }
    }
});
