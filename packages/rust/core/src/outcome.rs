//! Stage results and call budgets shared by every pipeline stage.

use std::future::Future;
use std::time::Duration;

use wordsearch_shared::{Result, WordSearchError};

/// What a non-fatal stage hands back: either its real product or a
/// substitute value together with the error that forced the substitution.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Produced(T),
    Fallback { value: T, cause: WordSearchError },
}

impl<T> StageOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Produced(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Produced(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The absorbed error, if a fallback was used.
    pub fn cause(&self) -> Option<&WordSearchError> {
        match self {
            Self::Produced(_) => None,
            Self::Fallback { cause, .. } => Some(cause),
        }
    }
}

/// Run `fut` with a time budget. Exceeding it yields [`WordSearchError::Timeout`],
/// which callers route down the same path as any other failure of that call.
pub async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(WordSearchError::Timeout {
            operation: operation.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        let produced: StageOutcome<u8> = StageOutcome::Produced(1);
        assert_eq!(*produced.value(), 1);
        assert!(!produced.is_fallback());
        assert!(produced.cause().is_none());

        let fallback = StageOutcome::Fallback {
            value: 2u8,
            cause: WordSearchError::Generation("down".into()),
        };
        assert!(fallback.is_fallback());
        assert_eq!(
            fallback.cause().map(|e| e.code()),
            Some("generation_failure")
        );
        assert_eq!(fallback.into_value(), 2);
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let ok = bounded(Duration::from_secs(1), "quick", async { Ok(5) }).await;
        assert_eq!(ok.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let slow = bounded(Duration::from_secs(2), "slow call", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        match slow {
            Err(WordSearchError::Timeout { operation, secs }) => {
                assert_eq!(operation, "slow call");
                assert_eq!(secs, 2);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
