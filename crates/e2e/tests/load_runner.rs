use multiload_common::{
    max_wait, run_load, work_fn, CryptoLoad, Error, KeyLength, LoadOutcome, LoadRun, LoadSettings,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Every launched worker reports back, and each ran for at least its budget.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_worker_runs_for_its_budget() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let work = work_fn("timestamp", move || {
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    });

    let budget = Duration::from_millis(40);
    let settings = LoadSettings::new(12, 40).unwrap();
    let report = LoadRun::launch(settings, Arc::new(work))
        .wait_with_timeout(Duration::from_secs(10))
        .await;

    assert_eq!(report.outcome, LoadOutcome::Completed);
    assert_eq!(report.workers.len(), 12);
    for worker in &report.workers {
        assert!(
            worker.busy >= budget,
            "worker {} stopped early after {:?}",
            worker.worker,
            worker.busy
        );
        assert!(!worker.cancelled);
    }
    assert_eq!(report.total_iterations(), calls.load(Ordering::Relaxed));
}

/// A worker overshoots its budget by at most the iteration that crossed it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_time_stays_within_one_iteration_of_budget() {
    let iteration = Duration::from_millis(20);
    let work = work_fn("sleepy", move || {
        std::thread::sleep(iteration);
        Ok(())
    });

    let budget = Duration::from_millis(50);
    let settings = LoadSettings::new(3, 50).unwrap();
    let report = LoadRun::launch(settings, Arc::new(work))
        .wait_with_timeout(Duration::from_secs(10))
        .await;

    // Scheduling jitter on a loaded machine
    let slack = Duration::from_millis(50);
    assert_eq!(report.outcome, LoadOutcome::Completed);
    assert_eq!(report.workers.len(), 3);
    for worker in &report.workers {
        assert!(worker.busy >= budget);
        assert!(
            worker.busy < budget + iteration + slack,
            "worker {} ran {:?} past a {:?} budget",
            worker.worker,
            worker.busy,
            budget
        );
        assert!(worker.iterations >= 2);
    }
}

/// Run time is measured from before the first worker is spawned.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn elapsed_covers_every_worker() {
    let work = work_fn("noop", || Ok(()));
    let settings = LoadSettings::new(8, 30).unwrap();
    let report = LoadRun::launch(settings, Arc::new(work))
        .wait_with_timeout(Duration::from_secs(10))
        .await;

    // elapsed_ms is truncated to whole milliseconds
    let elapsed = Duration::from_millis(report.elapsed_ms + 1);
    assert_eq!(report.outcome, LoadOutcome::Completed);
    for worker in &report.workers {
        assert!(
            elapsed >= worker.busy,
            "report elapsed {} ms is shorter than worker {} busy {:?}",
            report.elapsed_ms,
            worker.worker,
            worker.busy
        );
    }
}

/// Errors on every call are logged and counted but never end a worker early.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_work_unit_keeps_looping() {
    let work = work_fn("unsupported-cipher", || {
        Err(Error::Crypto("Cipher not available".to_string()))
    });

    let settings = LoadSettings::new(3, 30).unwrap();
    let report = LoadRun::launch(settings, Arc::new(work))
        .wait_with_timeout(Duration::from_secs(10))
        .await;

    assert_eq!(report.outcome, LoadOutcome::Completed);
    for worker in &report.workers {
        assert!(worker.iterations > 1);
        assert_eq!(worker.errors, worker.iterations);
        assert!(worker.busy >= Duration::from_millis(30));
    }
}

/// A single iteration longer than the wait bound times out without raising.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_iteration_times_out_quietly() {
    let work = work_fn("slow", || {
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    });

    // Four workers: the wait bound is zero
    let settings = LoadSettings::new(4, 1000).unwrap();
    assert_eq!(max_wait(4, 1000), Duration::ZERO);

    let start = Instant::now();
    let report = run_load(settings, Arc::new(work)).await;

    assert_eq!(report.outcome, LoadOutcome::TimedOut { pending: 4 });
    assert_eq!(report.max_wait_ms, 0);
    assert!(report.workers.is_empty());
    assert!(start.elapsed() < Duration::from_millis(300));
}

/// Workers left running by a timed-out wait stop at their next iteration.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_workers_are_cancelled() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let work = work_fn("tick", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        Ok(())
    });

    let settings = LoadSettings::new(2, 60_000).unwrap();
    let report = LoadRun::launch(settings, Arc::new(work))
        .wait_with_timeout(Duration::from_millis(50))
        .await;
    assert_eq!(report.outcome, LoadOutcome::TimedOut { pending: 2 });

    // Give the workers time to observe cancellation
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}

/// Separate runs never see each other's tasks.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runs_do_not_share_tasks() {
    let first = LoadRun::launch(
        LoadSettings::new(3, 0).unwrap(),
        Arc::new(work_fn("a", || Ok(()))),
    );
    let second = LoadRun::launch(
        LoadSettings::new(5, 0).unwrap(),
        Arc::new(work_fn("b", || Ok(()))),
    );
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 5);
    assert_ne!(first.run_id(), second.run_id());

    let a = first.wait_with_timeout(Duration::from_secs(10)).await;
    let b = second.wait_with_timeout(Duration::from_secs(10)).await;
    assert_eq!(a.workers.len(), 3);
    assert_eq!(b.workers.len(), 5);
    assert_eq!(b.work_unit, "b");
}

/// The crypto work unit sustains a short run without errors.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn crypto_load_runs_clean() {
    let settings = LoadSettings::new(5, 50).unwrap();
    let report = LoadRun::launch(settings, Arc::new(CryptoLoad::new(KeyLength::Aes256)))
        .wait_with_timeout(Duration::from_secs(10))
        .await;

    assert!(report.is_success());
    assert_eq!(report.work_unit, "crypto-load");
    assert_eq!(report.total_errors(), 0);
    assert!(report.total_iterations() >= 5);
}
