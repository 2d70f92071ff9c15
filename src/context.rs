use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-request cancellation scope.
///
/// A context is done once its token is cancelled or its deadline has passed,
/// whichever comes first. Clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { token: CancellationToken::new(), deadline: Some(deadline) }
    }

    /// Derive a context that is cancelled along with `self` but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    /// Like [`child`](Self::child), but the child also expires after
    /// `timeout` unless the parent's deadline is sooner.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Resolves when the context is cancelled or expires.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_by_clones_and_children() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();
        let child = ctx.child();

        ctx.cancel();
        assert!(clone.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn cancelling_a_child_leaves_parent_alone() {
        let ctx = RequestContext::new();
        let child = ctx.child();

        child.cancel();
        assert!(child.is_done());
        assert!(!ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn child_keeps_the_sooner_deadline() {
        let parent = RequestContext::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let short = parent.child_with_timeout(Duration::from_millis(10));
        assert!(short.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_expired());

        ctx.done().await;
        assert!(ctx.is_expired());
        assert!(!ctx.is_cancelled());
    }
}
