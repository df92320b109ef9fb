use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use review_watch::api::PullRequestStatus;
use review_watch::watcher::{
    BoundedSpawner, Change, ChannelSink, RootSupervisor, SupervisorError, WatchContext,
};

use super::{pull_request, repository, Harness, MockFetcher, INTERVAL};

#[tokio::test]
async fn test_fetch_failure_is_fatal() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Err(401)]);
    let harness = Harness::new(fetcher, &[]);
    let supervisor = RootSupervisor::new(harness.ctx.clone(), Vec::new());

    let result = supervisor.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(SupervisorError::Fetch(_))));
}

#[tokio::test]
async fn test_empty_repository_list_is_fatal() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Ok(Vec::new())]);
    let harness = Harness::new(fetcher, &[]);
    let supervisor = RootSupervisor::new(harness.ctx.clone(), Vec::new());

    let result = supervisor.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(SupervisorError::NoRepositories)));
}

#[tokio::test(start_paused = true)]
async fn test_only_repositories_of_interest_are_watched() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Ok(vec![
        repository("r1", "backend"),
        repository("r2", "frontend"),
        repository("r3", "infra"),
    ])]);
    let harness = Harness::new(fetcher.clone(), &[]);
    let supervisor = RootSupervisor::new(
        harness.ctx.clone(),
        vec!["backend".to_string(), "infra".to_string()],
    );
    let cancel = CancellationToken::new();

    let watched = supervisor.start(&cancel).await.unwrap();
    let names: Vec<&str> = watched.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["backend", "infra"]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let mut listed = fetcher.listed_repositories();
    listed.sort();
    assert_eq!(listed, vec!["r1", "r3"]);
    assert_eq!(fetcher.repository_calls(), 1);

    cancel.cancel();
    harness.spawner.tracker().close();
    harness.spawner.tracker().wait().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_matching_repository_still_runs() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Ok(vec![repository("r1", "backend")])]);
    let harness = Harness::new(fetcher.clone(), &[]);
    let supervisor = RootSupervisor::new(harness.ctx.clone(), vec!["missing".to_string()]);
    let cancel = CancellationToken::new();

    let watched = supervisor.start(&cancel).await.unwrap();
    assert!(watched.is_empty());
    tokio::time::sleep(INTERVAL).await;
    assert!(fetcher.listed_repositories().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_blocks_until_cancelled_and_stops_the_tree() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Ok(vec![repository("r1", "backend")])]);
    fetcher.script_pull_requests(
        "r1",
        vec![Ok(vec![pull_request(5, "ada", PullRequestStatus::Active, vec![])])],
    );
    fetcher.script_detail(
        5,
        vec![Ok(pull_request(5, "ada", PullRequestStatus::Active, vec![]))],
    );
    let mut harness = Harness::new(fetcher.clone(), &[]);
    let supervisor = RootSupervisor::new(harness.ctx.clone(), Vec::new());
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(supervisor.run(cancel.clone()));
    tokio::time::sleep(INTERVAL * 3).await;
    assert!(!handle.is_finished());

    let event = harness.events.recv().await.unwrap();
    assert_eq!(event.repository, "backend");
    assert_eq!(event.pull_request_id, 5);
    assert!(matches!(event.change, Change::PullRequestWatched { .. }));

    cancel.cancel();
    handle.await.unwrap().unwrap();

    harness.spawner.tracker().close();
    harness.spawner.tracker().wait().await;
    let calls = fetcher.detail_calls(5);
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fetcher.detail_calls(5), calls);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_spawner_still_stops_completed_pull_request() {
    let fetcher = MockFetcher::new();
    fetcher.script_repositories(vec![Ok(vec![repository("r1", "backend")])]);
    fetcher.script_pull_requests(
        "r1",
        vec![Ok(vec![pull_request(
            1,
            "alice",
            PullRequestStatus::Active,
            Vec::new(),
        )])],
    );
    fetcher.script_detail(
        1,
        vec![Ok(pull_request(
            1,
            "alice",
            PullRequestStatus::Completed,
            Vec::new(),
        ))],
    );

    let (sink, mut events) = ChannelSink::new();
    let spawner = BoundedSpawner::new(2);
    let ctx = WatchContext::new(
        fetcher.clone(),
        Arc::new(sink),
        Arc::new(spawner.clone()),
        INTERVAL,
        Vec::new(),
    );
    let cancel = CancellationToken::new();
    RootSupervisor::new(ctx, Vec::new())
        .start(&cancel)
        .await
        .unwrap();

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetcher.detail_calls(1), 1);
    assert!(fetcher.thread_calls(1) <= 1);
    assert!(fetcher.listed_repositories().len() >= 10);
    assert_eq!(spawner.available(), 2);

    let mut closed = false;
    while let Ok(event) = events.try_recv() {
        closed |= matches!(event.change, Change::PullRequestClosed { .. });
    }
    assert!(closed);

    cancel.cancel();
    spawner.tracker().close();
    spawner.tracker().wait().await;
}
