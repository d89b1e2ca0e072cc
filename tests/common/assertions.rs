//! Custom test assertions for integration tests

use hls_dl::Event;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;

/// Collect events until a terminal event (Completed, Canceled or Error) or timeout
pub async fn collect_events_until_terminal(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let terminal = matches!(
                event,
                Event::Completed | Event::Canceled | Event::Error { .. }
            );
            collected.push(event);
            if terminal {
                break;
            }
        }
    })
    .await;
    collected
}

/// Assert that `dir` holds no segment artifacts
pub fn assert_no_segments(dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with("segment"))
                .collect()
        })
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "segments left behind: {leftovers:?}");
}

/// Count progress events
pub fn progress_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::Progress(_)))
        .count()
}
