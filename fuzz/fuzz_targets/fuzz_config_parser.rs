#![no_main]

use std::path::Path;

use invisible_cost::config::ConfigLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();
        if let Ok(loaded) = loader.load_str(yaml, Path::new("fuzz.yaml")) {
            // anything that validates must also assemble
            let catalog = loaded.config.catalog().expect("validated catalog");
            let _ = loaded.config.triggers(&catalog);
        }
    }
});
