use tokio_util::sync::CancellationToken;

use review_watch::watcher::{Change, ThreadWatcher};

use super::{comment, repository, thread, Harness, MockFetcher, INTERVAL};

#[tokio::test]
async fn test_new_threads_and_comments_are_reported() {
    let fetcher = MockFetcher::new();
    fetcher.script_threads(
        3,
        vec![Ok(vec![
            thread(1, Some("active"), vec![comment(10, "bob", "Rename this")]),
            thread(2, None, vec![comment(11, "azure", "Bob joined as reviewer")]),
        ])],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = ThreadWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 3);

    watcher.tick().await;

    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![
            Change::ThreadCreated {
                thread_id: 1,
                status: "active".to_string(),
            },
            Change::CommentCreated {
                thread_id: 1,
                comment_id: 10,
                author: "bob".to_string(),
                content: "Rename this".to_string(),
            },
        ]
    );
    assert_eq!(watcher.snapshot().len(), 1);
    assert!(watcher.snapshot().contains_key(&1));
}

#[tokio::test]
async fn test_later_ticks_diff_against_latest_snapshot() {
    let fetcher = MockFetcher::new();
    fetcher.script_threads(
        3,
        vec![
            Ok(vec![thread(1, Some("active"), vec![comment(10, "bob", "Rename this")])]),
            Ok(vec![thread(
                1,
                Some("active"),
                vec![
                    comment(10, "bob", "Rename this please"),
                    comment(12, "ada", "Done"),
                ],
            )]),
            Ok(vec![thread(
                1,
                Some("fixed"),
                vec![
                    comment(10, "bob", "Rename this please"),
                    comment(12, "ada", "Done"),
                ],
            )]),
        ],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = ThreadWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 3);

    watcher.tick().await;
    harness.drain();

    watcher.tick().await;
    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![
            Change::CommentUpdated {
                thread_id: 1,
                comment_id: 10,
                author: "bob".to_string(),
                old_content: "Rename this".to_string(),
                new_content: "Rename this please".to_string(),
            },
            Change::CommentCreated {
                thread_id: 1,
                comment_id: 12,
                author: "ada".to_string(),
                content: "Done".to_string(),
            },
        ]
    );

    watcher.tick().await;
    let changes: Vec<Change> = harness.drain().into_iter().map(|e| e.change).collect();
    assert_eq!(
        changes,
        vec![Change::ThreadStatusChanged {
            thread_id: 1,
            old: "active".to_string(),
            new: "fixed".to_string(),
        }]
    );

    watcher.tick().await;
    assert!(harness.drain().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_leaves_snapshot() {
    let fetcher = MockFetcher::new();
    fetcher.script_threads(
        3,
        vec![
            Ok(vec![thread(1, Some("active"), vec![])]),
            Err(502),
            Ok(vec![thread(1, Some("active"), vec![])]),
        ],
    );
    let mut harness = Harness::new(fetcher, &[]);
    let mut watcher = ThreadWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 3);

    watcher.tick().await;
    assert_eq!(harness.drain().len(), 1);

    watcher.tick().await;
    assert_eq!(watcher.snapshot().len(), 1);
    assert!(harness.drain().is_empty());

    watcher.tick().await;
    assert!(harness.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_polls_immediately_then_every_interval_until_cancelled() {
    let fetcher = MockFetcher::new();
    let harness = Harness::new(fetcher.clone(), &[]);
    let watcher = ThreadWatcher::new(harness.ctx.clone(), repository("r1", "backend"), 3);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(watcher.run(cancel.clone()));

    tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
    assert_eq!(fetcher.thread_calls(3), 3);

    cancel.cancel();
    handle.await.unwrap();

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fetcher.thread_calls(3), 3);
}
