#![no_main]
use libfuzzer_sys::fuzz_target;
use segdisp_core::EngineCfg;

fuzz_target!(|data: &str| {
    // Parsing and validation must never panic. A document that validates must
    // also be accepted by the engine's own checks.
    let Ok(cfg) = segdisp_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let engine = EngineCfg::from(&cfg);
        assert_eq!(segdisp_core::builder::validate(&engine), Ok(()));
    }
});
