//! Per-request cancellation scope.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation scope handed to a producer for the lifetime of one request.
///
/// Collaborators must stop blocking work once [`cancelled`](Self::cancelled)
/// resolves; the scope is cancelled when the request deadline elapses, when
/// the request finishes, or when the server is forced down.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(token: CancellationToken, deadline: Instant) -> Self {
        Self { token, deadline }
    }

    /// Creates a scope with its own root token, bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
