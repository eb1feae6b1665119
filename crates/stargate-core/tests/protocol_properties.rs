//! Property-based tests for the gate protocol.
//!
//! Address entry, chevron ordering, cancellation and reset hold for arbitrary
//! glyph sequences in every dial mode.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use stargate_core::{
    DEFAULT_ABORT_RESET_DELAY, DEFAULT_CHEVRON_PAUSE, DialMode, EventReceiver, GLYPH_COUNT,
    GateEvent, GateProtocol, GateState, GlyphId, POINT_OF_ORIGIN, hash_address,
};

fn mode_strategy() -> impl Strategy<Value = DialMode> {
    prop::sample::select(DialMode::ALL.to_vec())
}

/// Distinct glyphs in random order.
fn distinct_glyphs(len: usize) -> impl Strategy<Value = Vec<GlyphId>> {
    prop::sample::subsequence((0..GLYPH_COUNT).collect::<Vec<_>>(), len).prop_shuffle()
}

/// A mode with a complete address for it.
fn complete_address() -> impl Strategy<Value = (DialMode, Vec<GlyphId>)> {
    mode_strategy().prop_flat_map(|mode| (Just(mode), distinct_glyphs(mode.max_glyphs())))
}

fn dialing_gate(mode: DialMode, address: &[GlyphId]) -> (GateProtocol, EventReceiver) {
    let mut gate = GateProtocol::default();
    let rx = gate.subscribe();
    assert!(gate.set_mode(mode));
    for &glyph in address {
        assert!(gate.add_glyph(glyph));
    }
    (gate, rx)
}

/// Answer ring tickets and wait out pauses until validation is requested.
/// Returns every `ChevronEncoding` as `(chevron, glyph)`.
fn run_to_validation(
    gate: &mut GateProtocol,
    rx: &mut EventReceiver,
    mut now: Instant,
) -> Vec<(u8, GlyphId)> {
    let mut encoded = Vec::new();
    for _ in 0..32 {
        for event in rx.drain() {
            match event {
                GateEvent::ChevronEncoding { chevron, glyph, .. } => encoded.push((chevron, glyph)),
                GateEvent::WaitForRing { request } => gate.ring_arrived(request, now).unwrap(),
                GateEvent::ValidateAddress { .. } => return encoded,
                _ => {},
            }
        }
        now += DEFAULT_CHEVRON_PAUSE;
        gate.tick(now);
    }
    panic!("dial never reached validation: {:?}", gate.snapshot());
}

proptest! {
    #[test]
    fn prop_buffer_keeps_entry_order(
        (mode, address) in complete_address()
    ) {
        let (gate, _rx) = dialing_gate(mode, &address);
        prop_assert_eq!(gate.buffer(), address);
        prop_assert_eq!(gate.state(), GateState::Dialing);
    }

    #[test]
    fn prop_buffer_bounded_and_unique(
        mode in mode_strategy(),
        glyphs in prop::collection::vec(0u8..GLYPH_COUNT, 0..30),
    ) {
        let mut gate: GateProtocol = GateProtocol::default();
        gate.set_mode(mode);

        for glyph in glyphs {
            let before = gate.buffer();
            let accepted = gate.add_glyph(glyph);

            let expected = !before.contains(&glyph) && before.len() < mode.max_glyphs();
            prop_assert_eq!(accepted, expected);

            let buffer = gate.buffer();
            prop_assert!(buffer.len() <= mode.max_glyphs());
            prop_assert_eq!(buffer.len(), before.len() + usize::from(accepted));
        }
    }

    #[test]
    fn prop_chevrons_lock_in_canon_order(
        (mode, address) in complete_address()
    ) {
        let (mut gate, mut rx) = dialing_gate(mode, &address);
        prop_assert!(gate.initiate_dial_sequence());

        let encoded = run_to_validation(&mut gate, &mut rx, Instant::now());

        prop_assert_eq!(gate.locked_chevrons(), mode.sequence().to_vec());
        prop_assert_eq!(gate.state(), GateState::Validating);

        let (chevrons, glyphs): (Vec<u8>, Vec<GlyphId>) = encoded.into_iter().unzip();
        prop_assert_eq!(chevrons, mode.sequence().to_vec());
        prop_assert_eq!(&glyphs[..address.len()], &address[..]);
        prop_assert_eq!(glyphs.last().copied(), Some(POINT_OF_ORIGIN));
    }

    #[test]
    fn prop_hash_is_deterministic(address in prop::collection::vec(0u8..GLYPH_COUNT, 0..9)) {
        prop_assert_eq!(hash_address(&address), hash_address(&address.clone()));
    }

    #[test]
    fn prop_abort_during_lock_stops_short(
        (mode, address) in complete_address(),
        abort_after in 1usize..9,
    ) {
        let abort_after = abort_after.min(mode.chevron_count() - 1);
        let (mut gate, mut rx) = dialing_gate(mode, &address);
        let mut now = Instant::now();
        gate.initiate_dial_sequence();

        // Lock `abort_after` chevrons, then abort inside the lock pause.
        while gate.locked_chevrons().len() < abort_after {
            for event in rx.drain() {
                if let GateEvent::WaitForRing { request } = event {
                    gate.ring_arrived(request, now).unwrap();
                }
            }
            if gate.locked_chevrons().len() < abort_after {
                now += DEFAULT_CHEVRON_PAUSE;
                gate.tick(now);
            }
        }
        prop_assert_eq!(gate.state(), GateState::ChevronLock);

        gate.abort(now);
        now += DEFAULT_CHEVRON_PAUSE;
        gate.tick(now);

        prop_assert_eq!(gate.locked_chevrons().len(), abort_after);
        prop_assert!(gate.locked_chevrons().len() < mode.chevron_count());
        prop_assert_eq!(gate.state(), GateState::Aborted);

        gate.tick(now + DEFAULT_ABORT_RESET_DELAY);
        prop_assert_eq!(gate.state(), GateState::Idle);
        prop_assert!(gate.buffer().is_empty());
        prop_assert!(gate.locked_chevrons().is_empty());
    }

    #[test]
    fn prop_reset_is_idempotent(
        mode in mode_strategy(),
        glyphs in prop::collection::vec(0u8..GLYPH_COUNT, 0..10),
        abort in any::<bool>(),
    ) {
        let mut gate: GateProtocol = GateProtocol::default();
        gate.set_mode(mode);
        for glyph in glyphs {
            gate.add_glyph(glyph);
        }
        if abort {
            gate.abort(Instant::now());
        }

        gate.reset();
        let once = gate.snapshot();
        gate.reset();

        prop_assert_eq!(gate.snapshot(), once.clone());
        prop_assert_eq!(once.state, GateState::Idle);
        prop_assert!(once.buffer.is_empty());
        prop_assert_eq!(gate.next_deadline(), None);
        prop_assert_eq!(gate.pending_request(), None);
    }
}

#[test]
fn auto_reset_waits_full_delay() {
    let mut gate: GateProtocol = GateProtocol::default();
    let now = Instant::now();
    gate.add_glyph(3);
    gate.abort(now);

    gate.tick(now + DEFAULT_ABORT_RESET_DELAY - Duration::from_millis(1));
    assert_eq!(gate.state(), GateState::Aborted);
    assert_eq!(gate.buffer(), vec![3]);

    gate.tick(now + DEFAULT_ABORT_RESET_DELAY);
    assert_eq!(gate.state(), GateState::Idle);
}
