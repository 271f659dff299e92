// crates/shared-kernel/src/infrastructure/retry.rs

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use crate::errors::{DomainError, Result};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Nombre total de tentatives (la première comprise)
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Pause avant la deuxième tentative, hors progression géométrique
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            initial_delay: Duration::from_millis(100),
        }
    }
}

/// Pause après l'échec de la tentative `attempt` (indexée depuis 0) :
/// `delay(0) = initial_delay`, `delay(n) = min(base · 2^(n-1), max)`.
pub fn delay_for_attempt(config: &RetryConfig, attempt: u32) -> Duration {
    if attempt == 0 {
        return config.initial_delay;
    }
    backoff_delay(config.base_backoff, config.max_backoff, attempt)
}

/// Progression géométrique plafonnée, partagée avec le dispatcher outbox.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(max)
}

/// Exécute une action avec retry borné et backoff exponentiel plafonné.
///
/// Les seuls points de suspension propres au moteur sont les pauses : si le
/// token est annulé pendant une pause, on rend `Cancelled` immédiatement,
/// sans tentative supplémentaire. À l'épuisement, la dernière erreur observée
/// est enveloppée dans `RetryExhausted`.
pub async fn with_retry<F, Fut, T>(
    cancel: &CancellationToken,
    config: RetryConfig,
    mut action: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err: Option<DomainError> = None;

    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        match action().await {
            Ok(res) => return Ok(res),
            Err(e) => {
                last_err = Some(e);
            }
        }

        if attempt + 1 == config.max_attempts {
            break;
        }

        let delay = delay_for_attempt(&config, attempt);

        tracing::warn!(
            attempt = attempt + 1,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "🔄 Attempt failed, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    Err(DomainError::RetryExhausted {
        max_attempts: config.max_attempts,
        source: Box::new(
            last_err.unwrap_or_else(|| DomainError::Internal("retry loop never ran".into())),
        ),
    })
}
