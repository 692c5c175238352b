use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Adds up to `initial_delay` of random spread to each wait.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Policy that runs the operation exactly once.
    pub fn none() -> Self {
        Self::new(RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn next_wait(&self, delay: Duration) -> Duration {
        if self.config.jitter {
            let spread = self.config.initial_delay.as_secs_f64() * rand::random::<f64>();
            delay + Duration::from_secs_f64(spread)
        } else {
            delay
        }
    }

    /// Retries only errors accepted by `should_retry`; others return at once.
    pub async fn retry_if<F, Fut, T, E, P>(&self, operation: F, should_retry: P) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        let mut delay = self.config.initial_delay;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Request succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(err) if !should_retry(&err) => return Err(err),
                Err(err) if attempt >= self.config.max_attempts => {
                    warn!("Request failed after {} attempts: {}", attempt, err);
                    return Err(err);
                }
                Err(err) => {
                    let wait = self.next_wait(delay);
                    warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, err, wait);
                    sleep(wait).await;

                    delay = Duration::from_secs_f64(
                        (delay.as_secs_f64() * self.config.multiplier)
                            .min(self.config.max_delay.as_secs_f64()),
                    );
                }
            }
        }
    }
}
