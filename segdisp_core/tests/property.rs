use proptest::prelude::*;
use segdisp_core::segment::{DECIMAL_POINT, decode};
use segdisp_core::{
    DIGITS, DigitBuffer, DisplayLayout, FILTER_WINDOW, MovingAverageFilter, ScaleCfg, to_scaled,
};

proptest! {
    #[test]
    fn update_returns_floor_mean_of_last_window(
        seed in prop::array::uniform8(any::<u16>()),
        stream in prop::collection::vec(any::<u16>(), 1..64),
    ) {
        let mut filter = MovingAverageFilter::<FILTER_WINDOW>::seed(seed);
        let mut history: Vec<u16> = seed.to_vec();
        for &x in &stream {
            let avg = filter.update(x);
            history.push(x);
            let window = &history[history.len() - FILTER_WINDOW..];
            let sum: u32 = window.iter().map(|&v| u32::from(v)).sum();
            prop_assert_eq!(filter.sum(), sum);
            prop_assert_eq!(u32::from(avg), sum / FILTER_WINDOW as u32);
        }
    }

    #[test]
    fn scaled_value_always_fits_the_panel(
        raw in any::<u16>(),
        reference_mv in 1u32..=100_000,
        full_scale in 1u16..=1023,
    ) {
        let v = to_scaled(raw, &ScaleCfg { reference_mv, full_scale });
        prop_assert!(v <= 9999);
    }

    #[test]
    fn scaling_is_monotonic_in_raw(a in 0u16..=1023, b in 0u16..=1023) {
        let scale = ScaleCfg::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(to_scaled(lo, &scale) <= to_scaled(hi, &scale));
    }

    #[test]
    fn buffer_spells_the_clamped_value(value in any::<u16>(), dp in prop::option::of(0usize..DIGITS), blank in any::<bool>()) {
        let layout = DisplayLayout { decimal_point: dp, blank_leading_zeros: blank };
        let buf = DigitBuffer::from_measurement(value, &layout);
        let mut rebuilt = 0u32;
        for pos in (0..DIGITS).rev() {
            let p = buf.pattern(pos);
            prop_assert_eq!(p & DECIMAL_POINT != 0, dp == Some(pos));
            rebuilt = rebuilt * 10 + u32::from(decode(p).unwrap_or(0));
        }
        prop_assert_eq!(rebuilt, u32::from(value.min(9999)));
        // Units digit is never blanked.
        prop_assert!(decode(buf.pattern(0)).is_some());
    }
}
