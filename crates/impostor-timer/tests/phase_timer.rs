//! Integration tests for the phase timer.
//!
//! Every test runs on a paused clock; Tokio auto-advances time whenever the
//! runtime has nothing else to do, so sleeps resolve instantly and exactly.

use std::time::Duration;

use impostor_timer::PhaseTimer;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Turn(u64),
    Vote(u64),
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_returns_token_after_deadline() {
    let mut timer = PhaseTimer::new();
    let start = Instant::now();
    timer.arm(Phase::Turn(1), Duration::from_secs(45));

    let token = timer.wait().await;

    assert_eq!(token, Phase::Turn(1));
    assert_eq!(start.elapsed(), Duration::from_secs(45));
    assert!(!timer.is_armed());
    assert_eq!(timer.metrics().fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_previous_deadline() {
    let mut timer = PhaseTimer::new();
    let start = Instant::now();
    timer.arm(Phase::Turn(1), Duration::from_secs(45));
    timer.arm(Phase::Vote(2), Duration::from_secs(30));

    assert_eq!(timer.wait().await, Phase::Vote(2));
    assert_eq!(start.elapsed(), Duration::from_secs(30));
    assert_eq!(timer.metrics().replaced, 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_duration_fires_immediately() {
    let mut timer = PhaseTimer::new();
    timer.arm(Phase::Turn(7), Duration::ZERO);
    assert_eq!(timer.wait().await, Phase::Turn(7));
}

#[tokio::test(start_paused = true)]
async fn test_remaining_counts_down() {
    let mut timer = PhaseTimer::new();
    timer.arm(Phase::Vote(1), Duration::from_secs(30));
    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(timer.remaining(), Some(Duration::from_secs(20)));
}

// =========================================================================
// Disarmed / cancelled
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_disarmed_timer_never_fires() {
    let mut timer: PhaseTimer<Phase> = PhaseTimer::new();
    let result = tokio::time::timeout(Duration::from_secs(3600), timer.wait()).await;
    assert!(result.is_err(), "disarmed timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_firing() {
    let mut timer = PhaseTimer::new();
    timer.arm(Phase::Turn(3), Duration::from_secs(5));
    assert_eq!(timer.cancel(), Some(Phase::Turn(3)));

    let result = tokio::time::timeout(Duration::from_secs(60), timer.wait()).await;
    assert!(result.is_err());
    assert_eq!(timer.metrics().cancelled, 1);
    assert_eq!(timer.metrics().fired, 0);
}

// =========================================================================
// select! integration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_losing_select_keeps_deadline_armed() {
    let mut timer = PhaseTimer::new();
    let start = Instant::now();
    timer.arm(Phase::Turn(1), Duration::from_secs(45));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<&str>();
    tx.send("clue").unwrap();

    // The command branch is ready first; the timer must survive the race.
    tokio::select! {
        biased;
        Some(cmd) = rx.recv() => assert_eq!(cmd, "clue"),
        _ = timer.wait() => panic!("timer should not fire before the command"),
    }
    assert!(timer.is_armed());

    let token = timer.wait().await;
    assert_eq!(token, Phase::Turn(1));
    assert_eq!(start.elapsed(), Duration::from_secs(45));
}

#[tokio::test(start_paused = true)]
async fn test_generation_tokens_let_callers_spot_stale_firings() {
    let mut timer = PhaseTimer::new();
    let mut generation = 0u64;

    generation += 1;
    timer.arm(Phase::Turn(generation), Duration::from_secs(45));
    generation += 1;
    timer.arm(Phase::Turn(generation), Duration::from_secs(45));

    match timer.wait().await {
        Phase::Turn(g) => assert_eq!(g, generation),
        other => panic!("unexpected token {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unrepresentable_delay_arms_without_firing() {
    let mut timer = PhaseTimer::new();
    timer.arm(Phase::Turn(1), Duration::MAX);
    assert!(timer.is_armed());

    tokio::select! {
        _ = timer.wait() => panic!("a practically infinite delay fired"),
        _ = tokio::time::sleep(Duration::from_secs(86_400 * 365)) => {}
    }
    assert!(timer.is_armed());
    assert_eq!(timer.metrics().fired, 0);
}
