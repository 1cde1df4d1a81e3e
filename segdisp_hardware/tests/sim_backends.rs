use rstest::rstest;
use segdisp_hardware::{SimPanel, SimulatedConverter};
use segdisp_traits::{Converter, DigitLines, SegmentBus};

fn convert_once(conv: &mut SimulatedConverter, channel: u8) -> u16 {
    conv.start_conversion(channel).expect("start");
    for _ in 0..16 {
        if conv.is_conversion_done().expect("poll") {
            return conv.read_result().expect("read");
        }
    }
    panic!("conversion did not complete");
}

#[rstest]
#[case(0, 5000, 0)]
#[case(250, 5000, 51)]
#[case(1000, 5000, 205)]
#[case(3300, 3300, 1023)]
#[case(9000, 5000, 1023)]
fn lm35_voltages_map_to_counts(#[case] mv: u32, #[case] reference: u32, #[case] expected: u16) {
    let mut conv = SimulatedConverter::new(mv, reference, 1023);
    assert_eq!(convert_once(&mut conv, 6), expected);
}

#[test]
fn sensor_handle_steers_a_moved_converter() {
    let conv = SimulatedConverter::new(500, 5000, 1023);
    let handle = conv.handle();
    let worker = std::thread::spawn(move || {
        let mut conv = conv;
        convert_once(&mut conv, 6)
    });
    let first = worker.join().expect("worker");
    assert_eq!(first, 102);
    handle.set_millivolts(0);
    assert_eq!(handle.conversions(), 1);
}

#[test]
fn disciplined_multiplexing_leaves_no_hazards() {
    let panel = SimPanel::new();
    let mut lines = panel.digit_lines();
    let mut bus = panel.segment_bus();
    let patterns = [0x6F, 0x4F, 0x86, 0x00];

    for _ in 0..3 {
        for (pos, &pattern) in patterns.iter().enumerate() {
            lines.disable_all().expect("disable");
            bus.write_pattern(pattern).expect("write");
            lines.enable_position(pos).expect("enable");
            assert_eq!(panel.active_lines(), 1);
        }
    }

    assert_eq!(panel.latched(), patterns);
    assert_eq!(panel.overlaps(), 0);
    assert_eq!(panel.ghost_writes(), 0);
    assert_eq!(panel.enables(), 12);
}
