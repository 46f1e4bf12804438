//! Cancellation-signal merging.
//!
//! A generation call races every network operation against a single
//! [`CancellationToken`]. This module builds that token out of however many
//! sources the caller supplies (typically one external token plus the
//! client's own), firing the merged token as soon as any source fires.

use tokio_util::sync::CancellationToken;

/// Merge several cancellation sources into one composite token.
///
/// The returned token is cancelled when the first source is cancelled. If a
/// source is already cancelled at merge time, the composite starts out
/// cancelled. Cancelling the composite directly never propagates back to the
/// sources; it also stops the internal watcher, so callers that finish early
/// should cancel (or drop-guard) the composite to release it.
pub fn merge_tokens<I>(sources: I) -> CancellationToken
where
    I: IntoIterator<Item = CancellationToken>,
{
    let sources: Vec<CancellationToken> = sources.into_iter().collect();
    let merged = CancellationToken::new();

    if sources.iter().any(|token| token.is_cancelled()) {
        merged.cancel();
        return merged;
    }
    if sources.is_empty() {
        return merged;
    }

    let downstream = merged.clone();
    tokio::spawn(async move {
        let any_source =
            futures::future::select_all(sources.iter().map(|token| Box::pin(token.cancelled())));
        tokio::select! {
            _ = downstream.cancelled() => {}
            _ = any_source => downstream.cancel(),
        }
    });

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_already_cancelled_source() {
        let source = CancellationToken::new();
        source.cancel();

        let merged = merge_tokens([source]);
        assert!(merged.is_cancelled());
    }

    #[tokio::test]
    async fn test_source_cancel_propagates() {
        let source = CancellationToken::new();
        let merged = merge_tokens([source.clone()]);
        assert!(!merged.is_cancelled());

        source.cancel();
        tokio::time::timeout(Duration::from_secs(1), merged.cancelled())
            .await
            .expect("merged token should fire after source cancel");
    }

    #[tokio::test]
    async fn test_any_of_several_sources_fires() {
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        let merged = merge_tokens([first.clone(), second.clone()]);

        second.cancel();
        tokio::time::timeout(Duration::from_secs(1), merged.cancelled())
            .await
            .expect("merged token should fire after any source cancels");
        assert!(!first.is_cancelled());
    }

    #[tokio::test]
    async fn test_merged_cancel_does_not_propagate() {
        let source = CancellationToken::new();
        let merged = merge_tokens([source.clone()]);

        merged.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!source.is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_source_set() {
        let merged = merge_tokens(Vec::<CancellationToken>::new());
        assert!(!merged.is_cancelled());

        merged.cancel();
        assert!(merged.is_cancelled());
    }
}
