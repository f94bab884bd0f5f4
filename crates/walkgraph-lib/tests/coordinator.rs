//! Stress tests for group admission.
//!
//! Worker threads hold admissions while a sampler thread checks that
//! mutators and readers are never active together.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use walkgraph_lib::{AdmissionPolicy, Coordinator, CoordinatorSnapshot, Group};

/// Run a mix of mutators, readers and occasional exclusive holders, and check
/// the exclusion invariant from inside and outside the admissions.
fn hammer(policy: AdmissionPolicy) {
    let coordinator = Coordinator::new(policy);
    let mutators_inside = AtomicUsize::new(0);
    let readers_inside = AtomicUsize::new(0);
    let exclusive_inside = AtomicUsize::new(0);
    let violation = AtomicBool::new(false);
    let running = AtomicBool::new(true);

    thread::scope(|scope| {
        scope.spawn(|| {
            while running.load(Ordering::Acquire) {
                if !coordinator.snapshot().is_consistent() {
                    violation.store(true, Ordering::Release);
                }
                thread::yield_now();
            }
        });

        let workers: Vec<_> = (0..12)
            .map(|worker| {
                let coordinator = &coordinator;
                let mutators_inside = &mutators_inside;
                let readers_inside = &readers_inside;
                let exclusive_inside = &exclusive_inside;
                let violation = &violation;
                scope.spawn(move || {
                    for round in 0..200 {
                        let group = match (worker + round) % 25 {
                            0 => Group::Exclusive,
                            n if n % 2 == 0 => Group::Mutate,
                            _ => Group::Query,
                        };
                        let _admission = coordinator.admit(group);
                        let (mine, others): (&AtomicUsize, &[&AtomicUsize]) = match group {
                            Group::Mutate => (mutators_inside, &[readers_inside, exclusive_inside]),
                            Group::Query => (readers_inside, &[mutators_inside, exclusive_inside]),
                            Group::Exclusive => (exclusive_inside, &[mutators_inside, readers_inside]),
                        };

                        let present = mine.fetch_add(1, Ordering::SeqCst);
                        if group == Group::Exclusive && present > 0 {
                            violation.store(true, Ordering::Release);
                        }
                        if others.iter().any(|other| other.load(Ordering::SeqCst) > 0) {
                            violation.store(true, Ordering::Release);
                        }
                        if round % 7 == 0 {
                            thread::sleep(Duration::from_micros(50));
                        }
                        mine.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker finished");
        }
        running.store(false, Ordering::Release);
    });

    assert!(!violation.load(Ordering::Acquire), "groups overlapped");
    assert_eq!(coordinator.snapshot(), CoordinatorSnapshot::default());
}

#[test]
fn greedy_keeps_groups_apart() {
    hammer(AdmissionPolicy::Greedy);
}

#[test]
fn alternating_keeps_groups_apart() {
    hammer(AdmissionPolicy::Alternating);
}

#[test]
fn readers_run_in_parallel() {
    let coordinator = Coordinator::default();
    let inside = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let _admission = coordinator.admit_query();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // Hold until every reader has arrived or a generous deadline passes.
                let deadline = std::time::Instant::now() + Duration::from_secs(2);
                while inside.load(Ordering::SeqCst) < 4 && std::time::Instant::now() < deadline {
                    thread::yield_now();
                }
                thread::sleep(Duration::from_millis(5));
                inside.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    assert_eq!(peak.load(Ordering::SeqCst), 4);
}

#[test]
fn waiting_reset_holds_back_new_readers() {
    let coordinator = Coordinator::default();
    let reader = coordinator.admit_query();

    thread::scope(|scope| {
        let reset = scope.spawn(|| coordinator.admit_exclusive().group());

        while coordinator.snapshot().waiting_exclusive == 0 {
            thread::yield_now();
        }

        assert!(coordinator
            .admit_within(Group::Query, Duration::from_millis(20))
            .is_err());

        drop(reader);
        assert_eq!(reset.join().expect("reset admitted"), Group::Exclusive);
    });

    assert_eq!(coordinator.snapshot(), CoordinatorSnapshot::default());
}

#[test]
fn alternating_serves_a_waiting_group_under_a_steady_stream() {
    let coordinator = Coordinator::new(AdmissionPolicy::Alternating);
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        // Overlapping readers keep the query group permanently busy.
        for _ in 0..3 {
            scope.spawn(|| {
                while !stop.load(Ordering::Acquire) {
                    let _admission = coordinator.admit_query();
                    thread::sleep(Duration::from_millis(1));
                }
            });
        }

        thread::sleep(Duration::from_millis(10));
        let admission = coordinator
            .admit_within(Group::Mutate, Duration::from_secs(5))
            .expect("mutator is served despite the reader stream");
        assert_eq!(admission.group(), Group::Mutate);
        drop(admission);
        stop.store(true, Ordering::Release);
    });
}
