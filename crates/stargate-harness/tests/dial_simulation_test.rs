//! End-to-end dial simulations.
//!
//! The full runtime (protocol, ring physics, whitelist, status line) runs
//! under virtual time with every standard invariant checked on each frame.

use std::{collections::BTreeMap, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stargate_app::{GateCommand, StaticWhitelist};
use stargate_core::{DialMode, GateState, POINT_OF_ORIGIN};
use stargate_harness::{
    RunOutcome, Simulation,
    fixtures::{ABYDOS, CHULAK, PROCEDURAL, UNLISTED, canon_whitelist, random_address},
    init_tracing,
};

const LIMIT: Duration = Duration::from_secs(120);

fn canon_sim() -> Simulation {
    init_tracing();
    Simulation::new(canon_whitelist().unwrap())
}

fn assert_clean(sim: &Simulation) {
    let violations = sim.driver().violations();
    assert!(violations.is_empty(), "invariant violations: {violations:?}\n{}", sim.report());
}

#[tokio::test]
async fn abydos_opens_wormhole() {
    let mut sim = canon_sim();
    sim.dial(0, &ABYDOS);

    let outcome = sim.run_until_state(GateState::ActiveOutbound, LIMIT).await;
    assert_eq!(outcome, RunOutcome::Reached, "{}", sim.report());

    let view = sim.runtime().view();
    assert_eq!(view.gate.locked_chevrons, vec![1, 8, 2, 7, 3, 6, 9]);
    assert_eq!(view.gate.destination.as_ref().map(|d| d.name.as_str()), Some("Abydos"));
    assert_eq!(view.status, "WORMHOLE ACTIVE: Abydos");
    assert_eq!(view.glyph_under_marker, POINT_OF_ORIGIN);

    let history = sim.state_history();
    assert_eq!(history.first(), Some(&GateState::Dialing));
    assert_eq!(history.last(), Some(&GateState::ActiveOutbound));
    assert_eq!(history.iter().filter(|&&s| s == GateState::ChevronLock).count(), 7);

    assert_clean(&sim);
}

#[tokio::test]
async fn ring_rests_on_each_glyph_as_its_chevron_locks() {
    let mut sim = canon_sim();
    sim.dial(0, &CHULAK);
    sim.run_until_state(GateState::ActiveOutbound, LIMIT).await;

    let mut under_marker = BTreeMap::new();
    for view in sim.driver().views() {
        if view.gate.state == GateState::ChevronLock {
            under_marker.entry(view.gate.locked_chevrons.len()).or_insert(view.glyph_under_marker);
        }
    }

    let glyphs: Vec<_> = under_marker.into_values().collect();
    let mut expected = CHULAK.to_vec();
    expected.push(POINT_OF_ORIGIN);
    assert_eq!(glyphs, expected);
    assert_clean(&sim);
}

#[tokio::test]
async fn procedural_address_finds_unexplored_world() {
    let mut sim = canon_sim();
    sim.dial(0, &PROCEDURAL);

    let outcome = sim.run_until_state(GateState::ActiveOutbound, LIMIT).await;
    assert_eq!(outcome, RunOutcome::Reached, "{}", sim.report());

    let destination = sim.runtime().gate().destination().cloned().unwrap();
    assert_eq!(destination.name, "P8X-332");
    assert_eq!(destination.kind, "unknown");
    assert_eq!(sim.runtime().status(), "WORMHOLE ACTIVE: P8X-332");
    assert_clean(&sim);
}

#[tokio::test]
async fn unknown_address_fails_then_idles() {
    let mut sim = canon_sim();
    sim.dial(0, &UNLISTED);

    assert_eq!(sim.run_until_state(GateState::Aborted, LIMIT).await, RunOutcome::Reached);
    assert_eq!(sim.runtime().status(), "NO CONNECTION - ADDRESS UNKNOWN");
    assert_eq!(sim.runtime().gate().locked_chevrons().len(), 7);
    let failed_at = sim.driver().current_time();

    assert_eq!(sim.run_until_state(GateState::Idle, LIMIT).await, RunOutcome::Reached);
    let idle_after = sim.driver().current_time() - failed_at;
    assert!(idle_after >= Duration::from_millis(1500), "reset after {idle_after:?}");
    assert!(idle_after < Duration::from_millis(1550), "reset after {idle_after:?}");
    assert!(sim.runtime().gate().buffer().is_empty());
    assert_clean(&sim);
}

#[tokio::test]
async fn abort_mid_dial_stops_the_ring() {
    let mut sim = canon_sim();
    sim.dial(0, &ABYDOS).at(5_000, GateCommand::Abort);

    assert_eq!(sim.run_until_state(GateState::Aborted, LIMIT).await, RunOutcome::Reached);
    let ring = sim.runtime().ring();
    assert!(!ring.is_spinning());
    assert!(!ring.has_pending_arrival());

    let locked = sim.runtime().gate().locked_chevrons();
    assert!(!locked.is_empty() && locked.len() < 7, "locked {locked:?}");
    let angle = ring.angle();

    assert_eq!(sim.run_until_state(GateState::Idle, LIMIT).await, RunOutcome::Reached);
    assert_eq!(sim.runtime().ring().angle(), angle, "ring moved after abort");
    assert!(sim.runtime().gate().locked_chevrons().is_empty());
    assert_clean(&sim);
}

#[tokio::test]
async fn shutdown_closes_active_wormhole() {
    let mut sim = canon_sim();
    sim.dial(0, &ABYDOS);
    sim.run_until_state(GateState::ActiveOutbound, LIMIT).await;

    sim.driver().inject(GateCommand::Shutdown);
    assert_eq!(sim.run_until_state(GateState::Shutdown, LIMIT).await, RunOutcome::Reached);
    assert_eq!(sim.runtime().status(), "SHUTDOWN");
    let shut_at = sim.driver().current_time();

    assert_eq!(sim.run_until_state(GateState::Idle, LIMIT).await, RunOutcome::Reached);
    assert!(sim.driver().current_time() - shut_at >= Duration::from_secs(2));
    assert_eq!(sim.runtime().gate().destination(), None);
    assert_clean(&sim);
}

#[tokio::test]
async fn incomplete_address_does_not_dial() {
    let mut sim = canon_sim();
    sim.dial(0, &ABYDOS[..4]);

    let outcome = sim
        .run_until(Duration::from_secs(3), |rt| !rt.gate().locked_chevrons().is_empty())
        .await;
    assert_eq!(outcome, RunOutcome::TimedOut);
    assert_eq!(sim.runtime().gate().state(), GateState::Dialing);
    assert!(!sim.runtime().ring().is_spinning());
    assert_clean(&sim);
}

#[tokio::test]
async fn every_mode_locks_its_full_sequence() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5747);

    for mode in DialMode::ALL {
        init_tracing();
        let mut sim = Simulation::new(StaticWhitelist::new());
        let address = random_address(&mut rng, mode);
        sim.at(0, GateCommand::SetMode(mode)).dial(0, &address);

        let outcome = sim
            .run_until(LIMIT, |rt| {
                matches!(rt.gate().state(), GateState::Aborted | GateState::ActiveOutbound)
            })
            .await;
        assert_eq!(outcome, RunOutcome::Reached, "{mode:?} {address:?}\n{}", sim.report());
        assert_eq!(sim.runtime().gate().locked_chevrons(), mode.sequence().to_vec());
        assert_clean(&sim);
    }
}

#[tokio::test]
async fn redial_after_reset() {
    let mut sim = canon_sim();
    sim.dial(0, &UNLISTED).at(3_000, GateCommand::Reset).dial(3_000, &CHULAK);

    let outcome = sim.run_until_state(GateState::ActiveOutbound, LIMIT).await;
    assert_eq!(outcome, RunOutcome::Reached, "{}", sim.report());
    assert_eq!(sim.runtime().gate().destination().map(|d| d.name.as_str()), Some("Chulak"));
    assert_clean(&sim);
}
