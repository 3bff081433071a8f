use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use om_generals::{Config, Error, Order, PathMessage, Session, Transcript, MAX_GENERALS};
use om_net::{expected_order, expected_reports, Net};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;


static INIT: std::sync::Once = std::sync::Once::new();

fn init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn paths(round: &[PathMessage]) -> BTreeSet<String> {
    round.iter().map(|msg| msg.to_string()).collect()
}

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Builds a valid loyalty vector of `1 + n % 7` generals where general `i`
/// is a traitor when bit `i` of `traitor_bits` is set, stopping once
/// `n > 3m` would no longer hold.
fn gen_loyalty(n: u8, traitor_bits: u8) -> Vec<bool> {
    let n = 1 + (n as usize) % 7;
    let max_traitors = (n - 1) / 3;
    let mut traitors = 0;
    (0..n)
        .map(|i| {
            if traitors < max_traitors && traitor_bits & (1 << i) != 0 {
                traitors += 1;
                false
            } else {
                true
            }
        })
        .collect()
}

#[test]
fn test_all_loyal_generals_report_the_order() -> eyre::Result<()> {
    init();
    let mut net = Net::new(vec![true; 4], 0)?;
    let round = net.broadcast(Order::Attack, 1)?;
    assert_eq!(net.transcript.text(), " 1:A \n");
    assert_eq!(round.len(), 1);
    Ok(())
}

#[test]
fn test_loyal_commander_with_traitor_lieutenant() -> eyre::Result<()> {
    init();
    // general 3 is the traitor, odd, so it relays Attack to everyone
    let mut net = Net::new(vec![true, true, true, false], 0)?;
    let round = net.broadcast(Order::Attack, 1)?;

    assert_eq!(paths(&round), set(&["2:1:A", "3:1:A"]));
    assert!(round.iter().all(|msg| msg.order() == Order::Attack));
    Ok(())
}

#[test]
fn test_even_traitor_lieutenant_lies_to_everyone() -> eyre::Result<()> {
    init();
    let mut net = Net::new(vec![true, true, false, true], 0)?;
    let round = net.broadcast(Order::Attack, 1)?;

    assert_eq!(paths(&round), set(&["2:1:R", "3:1:A"]));

    // from the other side of the table the traitor tells the same lie
    let mut net = Net::new(vec![true, true, false, true], 3)?;
    let round = net.broadcast(Order::Attack, 1)?;
    assert_eq!(paths(&round), set(&["0:1:A", "2:1:R"]));
    Ok(())
}

#[test]
fn test_traitor_commander_splits_lieutenants() -> eyre::Result<()> {
    init();
    let mut net = Net::new(vec![true, false, true, true], 0)?;
    let round = net.broadcast(Order::Attack, 1)?;

    // even lieutenants hear Retreat, odd ones Attack
    assert_eq!(paths(&round), set(&["2:1:R", "3:1:A"]));
    let orders = BTreeSet::from_iter(round.iter().map(PathMessage::order));
    assert_eq!(orders, BTreeSet::from_iter([Order::Attack, Order::Retreat]));
    Ok(())
}

#[test]
fn test_reporter_as_commander_reports_nothing() -> eyre::Result<()> {
    init();
    let mut net = Net::new(vec![true, true, true, false], 1)?;
    let round = net.broadcast(Order::Retreat, 1)?;
    assert!(round.is_empty());
    assert_eq!(net.transcript.text(), "\n");
    Ok(())
}

#[test]
fn test_two_traitors_among_seven() -> eyre::Result<()> {
    init();
    let loyalty = vec![true, true, false, true, true, false, true];
    let mut net = Net::new(loyalty.clone(), 1)?.with_jitter(7);
    let round = net.broadcast(Order::Attack, 0)?;

    assert_eq!(round.len(), 20);
    let config = Config::new(loyalty, 1)?;
    for msg in round.iter() {
        assert_eq!(msg.hops(), 3);
        assert_eq!(msg.commander(), Some(0));
        assert!(!msg.contains(1));
        assert_eq!(msg.order(), expected_order(&config, Order::Attack, msg, 1));
    }
    assert!(round.iter().any(|msg| msg.to_string() == "5:2:0:A"));
    assert!(round.iter().any(|msg| msg.to_string() == "3:2:0:R"));
    assert!(round.iter().any(|msg| msg.to_string() == "3:4:0:A"));
    assert_eq!(paths(&round).len(), 20);
    Ok(())
}

#[test]
fn test_several_rounds_share_one_session() -> eyre::Result<()> {
    init();
    let mut net = Net::new(vec![true, true, true, false], 0)?;
    net.broadcast(Order::Attack, 1)?;
    net.broadcast(Order::Retreat, 2)?;
    net.broadcast(Order::Retreat, 3)?;

    let rounds = net.transcript.rounds();
    assert_eq!(rounds.len(), 3);
    assert_eq!(paths(&rounds[0]), set(&["2:1:A", "3:1:A"]));
    assert_eq!(paths(&rounds[1]), set(&["1:2:R", "3:2:A"]));
    // traitor commander 3 tells even lieutenants Retreat, odd ones Attack
    assert_eq!(paths(&rounds[2]), set(&["1:3:A", "2:3:R"]));
    Ok(())
}

#[test]
fn test_minimal_configurations() {
    assert!(Config::new(vec![true, true, true, false], 0).is_ok());
    for traitor in 0..3 {
        let mut loyalty = vec![true; 3];
        loyalty[traitor] = false;
        assert!(matches!(
            Config::new(loyalty, 0),
            Err(Error::TooManyTraitors { n: 3, traitors: 1 })
        ));
    }
}

#[test]
fn test_repeated_setup_and_cleanup() -> eyre::Result<()> {
    init();
    for i in 0..50 {
        let loyalty = if i % 2 == 0 {
            vec![true, true, true, false]
        } else {
            vec![true, false, false]
        };
        match Config::new(loyalty, 0) {
            Ok(config) => {
                let session = Session::setup(config, Arc::new(Transcript::new()))?;
                session.cleanup();
                session.cleanup();
            }
            Err(err) => assert!(matches!(err, Error::TooManyTraitors { .. })),
        }
    }
    Ok(())
}

#[test]
fn test_cleanup_wakes_a_waiting_general() -> eyre::Result<()> {
    init();
    let net = Net::new(vec![true, true, true, false], 0)?;
    let session = net.session.clone();
    let general = net.runtime.spawn(async move { session.general(2).await });

    net.runtime
        .block_on(async { tokio::time::sleep(Duration::from_millis(20)).await });
    net.session.cleanup();

    let res = net.runtime.block_on(general)?;
    assert!(matches!(
        res,
        Err(Error::MailboxClosed {
            level: 1,
            general: 2
        })
    ));
    Ok(())
}

#[test]
fn test_watchdog_catches_a_missing_general() -> eyre::Result<()> {
    init();
    let config = Config::new(vec![true; 3], 0)?.with_watchdog(Duration::from_millis(100));
    let mut net = Net::with_config(config)?;

    let res = net.broadcast_to(Order::Attack, 0, Some(&[1]));
    assert!(matches!(
        res,
        Err(Error::BroadcastTimedOut { expected: 2, .. })
    ));
    Ok(())
}

#[quickcheck]
fn prop_setup_succeeds_iff_n_greater_than_three_m(loyalty: Vec<bool>, reporter: u8) -> TestResult {
    let loyalty: Vec<bool> = loyalty.into_iter().take(MAX_GENERALS).collect();
    let n = loyalty.len();
    if n == 0 {
        return TestResult::from_bool(Config::new(loyalty, 0).is_err());
    }
    let reporter = reporter as usize % n;
    let traitors = loyalty.iter().filter(|loyal| !**loyal).count();

    match Config::new(loyalty, reporter) {
        Ok(config) => TestResult::from_bool(n > 3 * traitors && config.traitors() == traitors),
        Err(Error::TooManyTraitors { .. }) => TestResult::from_bool(n <= 3 * traitors),
        Err(_) => TestResult::failed(),
    }
}

#[quickcheck]
fn prop_om_round(
    n: u8,
    traitor_bits: u8,
    reporter: u8,
    commander: u8,
    attack: bool,
    seed: u64,
) -> eyre::Result<TestResult> {
    init();
    let loyalty = gen_loyalty(n, traitor_bits);
    let n = loyalty.len();
    let reporter = reporter as usize % n;
    let commander = commander as usize % n;
    let order = if attack { Order::Attack } else { Order::Retreat };

    let config = Config::new(loyalty, reporter)?;
    let traitors = config.traitors();
    let mut net = Net::with_config(config.clone())?.with_jitter(seed);
    let round = net.broadcast(order, commander)?;

    if reporter == commander {
        return Ok(TestResult::from_bool(round.is_empty()));
    }

    // one report per loop-free path, each path ending at the commander
    assert_eq!(round.len(), expected_reports(n, traitors));
    assert_eq!(paths(&round).len(), round.len());
    for msg in round.iter() {
        assert!(msg.validate(n).is_ok(), "path with a cycle: {}", msg);
        assert_eq!(msg.hops(), traitors + 1);
        assert_eq!(msg.commander(), Some(commander));
        assert!(!msg.contains(reporter));
        assert_eq!(msg.order(), expected_order(&config, order, msg, reporter));
    }

    // a loyal commander whose order only passed through loyal hands arrives intact
    if config.is_loyal(commander) {
        for msg in round.iter() {
            if msg.path().iter().all(|id| config.is_loyal(*id)) {
                assert_eq!(msg.order(), order);
            }
        }
    }

    Ok(TestResult::passed())
}
