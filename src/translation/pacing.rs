use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default pause before each request to the translation endpoint.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(300);

pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Spaces out consecutive requests to the remote endpoint.
pub trait Pacer: Send + Sync {
    fn pause(&self, delay: Duration) -> PauseFuture<'_>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, delay: Duration) -> PauseFuture<'_> {
        Box::pin(tokio::time::sleep(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn tokio_pacer_sleeps_for_the_delay() {
        let started = Instant::now();
        TokioPacer.pause(DEFAULT_REQUEST_DELAY).await;
        assert!(started.elapsed() >= DEFAULT_REQUEST_DELAY);
    }
}
