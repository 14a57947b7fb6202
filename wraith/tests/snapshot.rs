mod common;

use wraith::Gameboy;

/// Counts up at 0xC000 forever, with the timer and VBlank interrupts feeding counters of their
/// own at 0xC001 and 0xC002.
fn busy_gameboy() -> Gameboy {
    let mut program = vec![
        0x3E, 0x05, // LD A, 0x05
        0xE0, 0xFF, // LDH (0xFF), A
        0xE0, 0x07, // LDH (0x07), A
        0xFB, // EI
        0x21, 0x00, 0xC0, // LD HL, 0xC000
        0x34, // INC (HL)
        0x18, 0xFD, // JR -3
    ];
    let mut rom = common::rom(0x00, 0x00, 0x00, &[]);
    rom[0x150..0x150 + program.len()].copy_from_slice(&program);
    // VBlank handler
    program = vec![0xFA, 0x02, 0xC0, 0x3C, 0xEA, 0x02, 0xC0, 0xD9];
    rom[0x40..0x40 + program.len()].copy_from_slice(&program);
    // Timer handler
    program = vec![0xFA, 0x01, 0xC0, 0x3C, 0xEA, 0x01, 0xC0, 0xD9];
    rom[0x50..0x50 + program.len()].copy_from_slice(&program);
    Gameboy::new(rom).unwrap()
}

#[test]
fn postcard_snapshot_resumes_identically() {
    let mut gb = busy_gameboy();
    gb.next_frame().unwrap();
    for _ in 0..1234 {
        gb.step().unwrap();
    }
    let bytes = postcard::to_allocvec(&gb).unwrap();
    let mut restored: Gameboy = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(restored, gb);

    for _ in 0..3 {
        gb.next_frame().unwrap();
        restored.next_frame().unwrap();
    }
    assert_eq!(restored, gb);
    assert_eq!(restored.frame(), gb.frame());
    assert_ne!(gb.read_byte(0xC001), 0);
    assert_ne!(gb.read_byte(0xC002), 0);
}

#[test]
fn json_snapshot() {
    let mut gb = busy_gameboy();
    for _ in 0..5000 {
        gb.step().unwrap();
    }
    let json = serde_json::to_string(&gb).unwrap();
    let restored: Gameboy = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, gb);
}

#[test]
fn snapshots_keep_the_clock_running() {
    let mut gb = Gameboy::new(common::rom(0x10, 0x00, 0x03, &[0x18, 0xFE])).unwrap();
    gb.next_frame().unwrap();
    let bytes = postcard::to_allocvec(&gb).unwrap();
    let restored: Gameboy = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(restored, gb);
    assert_eq!(restored.header(), gb.header());
}

/// The cycles taken by each of the next `steps` steps.
fn cycle_trace(gb: &mut Gameboy, steps: usize) -> Vec<u8> {
    (0..steps).map(|_| gb.step().unwrap()).collect()
}

#[test]
fn restored_sessions_take_the_same_cycles() {
    let mut gb = busy_gameboy();
    gb.next_frame().unwrap();
    cycle_trace(&mut gb, 2500);
    let bytes = postcard::to_allocvec(&gb).unwrap();
    let json = serde_json::to_string(&gb).unwrap();
    let mut from_postcard: Gameboy = postcard::from_bytes(&bytes).unwrap();
    let mut from_json: Gameboy = serde_json::from_str(&json).unwrap();

    let expected = cycle_trace(&mut gb, 10_000);
    // Interrupts are dispatched during the window.
    assert!(expected.contains(&20));
    assert_eq!(cycle_trace(&mut from_postcard, 10_000), expected);
    assert_eq!(cycle_trace(&mut from_json, 10_000), expected);
    assert_eq!(from_postcard, gb);
    assert_eq!(from_json, gb);
    assert_eq!(from_postcard.frame(), gb.frame());
    assert_eq!(from_json.frame_count(), gb.frame_count());
}

#[test]
fn snapshots_restore_many_times() {
    let mut gb = busy_gameboy();
    for _ in 0..20 {
        cycle_trace(&mut gb, 500);
        let bytes = postcard::to_allocvec(&gb).unwrap();
        let restored: Gameboy = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(restored, gb);
        gb = restored;
    }
    assert_ne!(gb.read_byte(0xC000), 0);
}
