use std::time::Duration;

/// Bounded retry with exponential backoff for calls that cross a network
/// boundary. Only errors the caller classifies as retryable are retried;
/// anything else surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry: base, 2x base, 4x base, ...
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    pub fn run<T, E, F, R>(&self, op: F, retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        R: Fn(&E) -> bool,
    {
        self.run_with_sleeper(op, retryable, std::thread::sleep)
    }

    fn run_with_sleeper<T, E, F, R, S>(
        &self,
        mut op: F,
        retryable: R,
        mut sleep: S,
    ) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        R: Fn(&E) -> bool,
        S: FnMut(Duration),
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && retryable(&err) => {
                    log::debug!("attempt {}/{} failed, backing off", attempt, attempts);
                    sleep(self.delay_before(attempt));
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
