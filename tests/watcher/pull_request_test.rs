use std::time::Duration;

use tokio_util::sync::CancellationToken;

use review_watch::api::{PullRequestStatus, Vote};
use review_watch::watcher::{Change, PullRequestWatcher, TickOutcome, WatchState};

use super::{pull_request, repository, reviewer, Harness, MockFetcher, INTERVAL};

#[tokio::test]
async fn test_first_tick_reports_cast_votes() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        1,
        vec![Ok(pull_request(
            1,
            "ada",
            PullRequestStatus::Active,
            vec![reviewer("bob", Vote::Approved), reviewer("eve", Vote::NoVote)],
        ))],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);

    assert_eq!(watcher.state(), WatchState::Unstarted);
    assert_eq!(watcher.tick().await, TickOutcome::Continue);
    assert_eq!(watcher.state(), WatchState::Tracking);

    let events = harness.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].repository, "backend");
    assert_eq!(events[0].pull_request_id, 1);
    assert_eq!(
        events[0].change,
        Change::VoteAdded {
            reviewer: "bob".to_string(),
            vote: Vote::Approved,
        }
    );
}

#[tokio::test]
async fn test_vote_transitions_across_ticks() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        1,
        vec![
            Ok(pull_request(
                1,
                "ada",
                PullRequestStatus::Active,
                vec![reviewer("bob", Vote::NoVote)],
            )),
            Ok(pull_request(
                1,
                "ada",
                PullRequestStatus::Active,
                vec![reviewer("bob", Vote::Approved)],
            )),
            Ok(pull_request(
                1,
                "ada",
                PullRequestStatus::Active,
                vec![reviewer("bob", Vote::Rejected)],
            )),
        ],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);

    watcher.tick().await;
    assert!(harness.drain().is_empty());

    watcher.tick().await;
    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![Change::VoteAdded {
            reviewer: "bob".to_string(),
            vote: Vote::Approved,
        }]
    );

    watcher.tick().await;
    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![Change::VoteChanged {
            reviewer: "bob".to_string(),
            old: Vote::Approved,
            new: Vote::Rejected,
        }]
    );
}

#[tokio::test]
async fn test_failed_fetch_keeps_state() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        1,
        vec![
            Err(503),
            Ok(pull_request(1, "ada", PullRequestStatus::Active, vec![])),
            Err(500),
            Ok(pull_request(1, "ada", PullRequestStatus::Active, vec![])),
        ],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);

    assert_eq!(watcher.tick().await, TickOutcome::Continue);
    assert_eq!(watcher.state(), WatchState::Unstarted);
    assert!(watcher.previous().is_none());

    watcher.tick().await;
    assert_eq!(watcher.state(), WatchState::Tracking);

    assert_eq!(watcher.tick().await, TickOutcome::Continue);
    assert_eq!(watcher.state(), WatchState::Tracking);
    assert!(watcher.previous().is_some());

    watcher.tick().await;
    assert!(harness.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_status_stops_polling() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        1,
        vec![
            Ok(pull_request(1, "ada", PullRequestStatus::Active, vec![])),
            Ok(pull_request(1, "ada", PullRequestStatus::Completed, vec![])),
        ],
    );
    let mut harness = Harness::new(fetcher.clone(), &[]);
    let watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);
    let cancel = CancellationToken::new();

    tokio::time::timeout(INTERVAL * 5, watcher.run(cancel.clone()))
        .await
        .expect("watcher should stop on terminal status");

    assert!(cancel.is_cancelled());
    assert_eq!(fetcher.detail_calls(1), 2);

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetcher.detail_calls(1), 2);

    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![
            Change::StatusChanged {
                old: PullRequestStatus::Active,
                new: PullRequestStatus::Completed,
            },
            Change::PullRequestClosed {
                status: PullRequestStatus::Completed,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_on_first_fetch_stops() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        1,
        vec![Ok(pull_request(1, "ada", PullRequestStatus::Abandoned, vec![]))],
    );
    let mut harness = Harness::new(fetcher.clone(), &[]);
    let watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);

    watcher.run(CancellationToken::new()).await;

    assert_eq!(fetcher.detail_calls(1), 1);
    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![Change::PullRequestClosed {
            status: PullRequestStatus::Abandoned,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_watcher_does_not_poll() {
    let fetcher = MockFetcher::new();
    let harness = Harness::new(fetcher.clone(), &[]);
    let watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    watcher.run(cancel).await;
    assert_eq!(fetcher.detail_calls(1), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failures_do_not_stop_the_watcher() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(1, vec![Err(500)]);
    let harness = Harness::new(fetcher.clone(), &[]);
    let watcher = PullRequestWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 1);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(watcher.run(cancel.clone()));
    tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;
    assert_eq!(fetcher.detail_calls(1), 4);
    assert!(!handle.is_finished());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_announces_and_stops_thread_watcher_on_terminal() {
    let fetcher = MockFetcher::new();
    fetcher.script_detail(
        7,
        vec![
            Ok(pull_request(7, "ada", PullRequestStatus::Active, vec![])),
            Ok(pull_request(7, "ada", PullRequestStatus::Active, vec![])),
            Ok(pull_request(7, "ada", PullRequestStatus::Completed, vec![])),
        ],
    );
    let mut harness = Harness::new(fetcher.clone(), &[]);
    let listed = pull_request(7, "ada", PullRequestStatus::Active, vec![]);
    let cancel = CancellationToken::new();

    PullRequestWatcher::start(
        &harness.ctx,
        &repository("r1", "backend"),
        &listed,
        cancel.clone(),
    );

    let first = harness.events.recv().await.unwrap();
    assert!(matches!(first.change, Change::PullRequestWatched { .. }));
    assert_eq!(first.pull_request_id, 7);

    harness.spawner.tracker().close();
    tokio::time::timeout(INTERVAL * 10, harness.spawner.tracker().wait())
        .await
        .expect("both watchers should stop");

    assert!(cancel.is_cancelled());
    assert_eq!(fetcher.detail_calls(7), 3);
    let thread_calls = fetcher.thread_calls(7);
    assert!(thread_calls >= 2);

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetcher.detail_calls(7), 3);
    assert_eq!(fetcher.thread_calls(7), thread_calls);
}
