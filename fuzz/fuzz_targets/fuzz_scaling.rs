#![no_main]
use libfuzzer_sys::fuzz_target;
use segdisp_core::digits::MAX_DISPLAY;
use segdisp_core::{DigitBuffer, DisplayLayout, ScaleCfg, to_scaled};

fuzz_target!(|input: (u16, u16, u32, u16, bool)| {
    let (a, b, reference_mv, full_scale, blank) = input;
    let scale = ScaleCfg {
        reference_mv: reference_mv.max(1),
        full_scale: full_scale.clamp(1, 1023),
    };
    let (lo, hi) = (a.min(b), a.max(b));
    let (slo, shi) = (to_scaled(lo, &scale), to_scaled(hi, &scale));
    assert!(shi <= MAX_DISPLAY);
    assert!(slo <= shi, "scaling must be monotonic");

    let layout = DisplayLayout {
        decimal_point: Some(2),
        blank_leading_zeros: blank,
    };
    let shown = DigitBuffer::from_measurement(shi, &layout).to_string();
    let digits: String = shown.chars().filter(char::is_ascii_digit).collect();
    assert_eq!(digits.parse::<u16>().ok(), Some(shi));
});
