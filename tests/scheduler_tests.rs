use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::timeout;

use taskpool::{
    JobError, JobOutcome, PoolConfig, Schedule, Scheduler, Task,
};

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn small_scheduler() -> Scheduler {
    Scheduler::with_config(PoolConfig::new(1, 2))
}

#[tokio::test]
async fn test_every_strategy_rejects_an_empty_task_synchronously() {
    let scheduler = small_scheduler();
    let strategies: Vec<&dyn Schedule> = vec![
        &scheduler.immediate,
        &scheduler.micro,
        &scheduler.timeout,
        &scheduler.pool,
    ];

    for strategy in strategies {
        assert!(strategy.schedule(Task::empty()).is_cancelled());
        assert!(strategy
            .delay(Task::empty(), Duration::from_millis(100))
            .is_cancelled());
    }

    // No agent interaction happened for the pool.
    let stats = scheduler.pool.dispatcher().stats().await.expect("pool alive");
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.queued, 0);
}

#[tokio::test]
async fn test_immediate_schedule_runs_before_returning() {
    let scheduler = small_scheduler();
    let ran = Arc::new(AtomicBool::new(false));

    let flag = ran.clone();
    let token = scheduler
        .immediate
        .schedule(Task::new(move || flag.store(true, Ordering::SeqCst)));

    assert!(ran.load(Ordering::SeqCst), "immediate runs synchronously");
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn test_micro_and_timeout_defer_execution() {
    let scheduler = small_scheduler();

    for strategy in [&scheduler.micro as &dyn Schedule, &scheduler.timeout] {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        strategy.schedule(Task::new(move || {}).on_complete(move |outcome| {
            done_tx.send(outcome.is_success()).unwrap();
        }));
        assert!(recv(&mut done_rx).await);
    }
}

#[tokio::test]
async fn test_pool_schedule_runs_off_the_calling_thread() {
    let scheduler = small_scheduler();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let caller = std::thread::current().id();
    scheduler.pool.schedule(
        Task::new(move || {
            done_tx.send(std::thread::current().id() != caller).unwrap();
        }),
    );

    assert!(recv(&mut done_rx).await, "pool work runs on an agent thread");
}

#[tokio::test]
async fn test_delay_waits_for_the_timer() {
    let scheduler = small_scheduler();
    let amount = Duration::from_millis(50);

    for strategy in [
        &scheduler.immediate as &dyn Schedule,
        &scheduler.micro,
        &scheduler.timeout,
        &scheduler.pool,
    ] {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        strategy.delay(
            Task::new(|| {}).on_complete(move |_| {
                done_tx.send(Instant::now()).unwrap();
            }),
            amount,
        );
        let fired_at = recv(&mut done_rx).await;
        assert!(
            fired_at.duration_since(started) >= amount,
            "task fired before its delay elapsed"
        );
    }
}

#[tokio::test]
async fn test_cancel_during_the_timer_stops_every_strategy() {
    let scheduler = small_scheduler();
    let ran = Arc::new(AtomicUsize::new(0));

    let mut tokens = Vec::new();
    for strategy in [
        &scheduler.immediate as &dyn Schedule,
        &scheduler.micro,
        &scheduler.timeout,
        &scheduler.pool,
    ] {
        let ran = ran.clone();
        tokens.push(strategy.delay(
            Task::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }),
            Duration::from_millis(200),
        ));
    }

    for token in &tokens {
        token.cancel();
    }

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    let stats = scheduler.pool.dispatcher().stats().await.expect("pool alive");
    assert_eq!(stats.queued, 0, "cancelled delayed job must never be submitted");
}

#[tokio::test]
async fn test_pool_delay_submits_only_after_the_timer() {
    let scheduler = small_scheduler();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    scheduler.pool.delay(
        Task::new(|| {}).on_complete(move |outcome| {
            done_tx.send(outcome.is_success()).unwrap();
        }),
        Duration::from_millis(200),
    );

    let stats = scheduler.pool.dispatcher().stats().await.expect("pool alive");
    assert_eq!(stats.idle, 1, "nothing reaches the pool while the timer runs");

    assert!(recv(&mut done_rx).await);
}

#[tokio::test]
async fn test_failure_outcome_reaches_the_completion_observer() {
    let scheduler = small_scheduler();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    scheduler.immediate.schedule(
        Task::fallible(|| Err(JobError::Failed("unreachable host".into()))).on_complete(
            move |outcome| {
                done_tx.send(outcome).unwrap();
            },
        ),
    );

    let outcome = recv(&mut done_rx).await;
    assert!(matches!(
        outcome,
        JobOutcome::Failed(JobError::Failed(ref msg)) if msg == "unreachable host"
    ));
}

#[tokio::test]
async fn test_cancelling_micro_before_it_polls_suppresses_the_task() {
    // On the single-threaded test runtime the spawned task cannot be polled
    // until the next await point, so cancelling here always wins the race.
    let scheduler = small_scheduler();
    let ran = Arc::new(AtomicBool::new(false));

    let flag = ran.clone();
    let token = scheduler
        .micro
        .schedule(Task::new(move || flag.store(true, Ordering::SeqCst)));
    token.cancel();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_facade_shares_one_pool_across_calls() {
    let scheduler = Scheduler::with_config(PoolConfig::new(1, 1));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    for _ in 0..4 {
        let done_tx = done_tx.clone();
        scheduler
            .pool
            .schedule(Task::new(|| {}).on_complete(move |_| done_tx.send(()).unwrap()));
    }
    for _ in 0..4 {
        recv(&mut done_rx).await;
    }

    let stats = scheduler.pool.dispatcher().stats().await.expect("pool alive");
    assert_eq!(stats.agents, 1);
}
