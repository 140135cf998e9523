//! Property tests for the session controller
//!
//! Random interleavings of user commands, helper completions and pipeline
//! messages must never leave the session pointing at a stale URI.

mod common;

use ambience_core::{Entry, SourceKind};
use ambience_engine::{EngineState, PipelineMessage};
use ambience_resolver::ResolveError;
use ambience_session::{SessionNotification, SessionSnapshot, SessionState};
use common::{all_entries, FakeResolver, Harness};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Activate(usize),
    Deactivate,
    Resolve(usize),
    FailResolve(usize),
    UriChanged(usize),
    EndOfStream,
    Error,
}

fn op() -> impl Strategy<Value = Op> {
    let entries = all_entries().len();
    prop_oneof![
        4 => (0..entries).prop_map(Op::Activate),
        1 => Just(Op::Deactivate),
        3 => (0..entries).prop_map(Op::Resolve),
        1 => (0..entries).prop_map(Op::FailResolve),
        3 => (0..entries).prop_map(Op::UriChanged),
        1 => Just(Op::EndOfStream),
        1 => Just(Op::Error),
    ]
}

/// URI the pipeline receives for `entry`
fn playback_uri(entry: &Entry) -> String {
    match entry.source_kind {
        SourceKind::VideoLink => format!("https://stream/{}.m4a", entry.id),
        _ => entry.locator.clone(),
    }
}

async fn settle(h: &Harness) {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    h.handle.flush().await.unwrap();
}

fn check(snapshot: &SessionSnapshot, last_set_uri: Option<&String>) -> Result<(), TestCaseError> {
    match snapshot.state {
        SessionState::Inactive | SessionState::Faulted => {
            prop_assert!(snapshot.active_entry.is_none());
            prop_assert!(snapshot.playback_uri.is_none());
        }
        SessionState::Resolving => {
            let entry = snapshot.active_entry.as_ref();
            prop_assert!(entry.is_some_and(|e| e.source_kind == SourceKind::VideoLink));
        }
        SessionState::Playing => {
            prop_assert!(snapshot.active_entry.is_some());
        }
    }

    if let Some(uri) = &snapshot.playback_uri {
        let entry = snapshot.active_entry.as_ref();
        prop_assert!(entry.is_some());
        prop_assert_eq!(uri, &playback_uri(entry.unwrap()));
        prop_assert_eq!(Some(uri), last_set_uri);
    }

    if snapshot.engine_state == EngineState::Playing {
        prop_assert_eq!(snapshot.state, SessionState::Playing);
        prop_assert!(snapshot.playback_uri.is_some());
    }
    Ok(())
}

async fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let entries = all_entries();
    let mut h = Harness::start_manual(FakeResolver::ignoring_cancellation()).await;

    for op in ops {
        match op {
            Op::Activate(i) => h.handle.activate(entries[i].clone()).unwrap(),
            Op::Deactivate => h.handle.deactivate().unwrap(),
            Op::Resolve(i) => {
                h.resolver
                    .complete(&entries[i].locator, Ok(playback_uri(&entries[i])));
            }
            Op::FailResolve(i) => {
                h.resolver
                    .complete(&entries[i].locator, Err(ResolveError::failed("gone")));
            }
            Op::UriChanged(i) => {
                h.probe
                    .emit(PipelineMessage::UriChanged(playback_uri(&entries[i])));
            }
            Op::EndOfStream => {
                h.probe.emit(PipelineMessage::EndOfStream);
            }
            Op::Error => {
                h.probe.emit(PipelineMessage::Error("boom".to_string()));
            }
        }
        settle(&h).await;

        let uris = h.probe.uris();
        check(&h.handle.snapshot(), uris.last())?;
    }

    // Notifications never describe an entry that was not requested
    while let Ok(notification) = h.notifications.try_recv() {
        if let SessionNotification::Playing(entry) = notification {
            prop_assert!(entries.contains(&entry));
        }
    }

    h.handle.shutdown().await.unwrap();
    prop_assert!(!h.probe.is_subscribed());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn session_never_points_at_a_stale_uri(ops in prop::collection::vec(op(), 1..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_ops(ops))?;
    }
}
