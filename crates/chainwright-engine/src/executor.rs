//! Deployment executor: one artifact at a time, with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use chainwright_core::{
    ArtifactSpec, DeployError, DeployedArtifact, HookSpec, ResolvedArg, Result,
};

use crate::client::ChainClient;

/// Retry behavior for transient chain-client failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total submission attempts per artifact (first try included).
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles per attempt.
    pub initial_delay: Duration,

    /// Upper bound on the backoff delay.
    pub max_delay: Duration,

    /// How long to wait for a single submission to confirm. A submitted
    /// transaction is not abortable; this bounds the wait, and the
    /// timeout is treated as a transient transport failure.
    pub submit_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            submit_timeout: Duration::from_secs(60),
        }
    }
}

/// Exponential backoff delay for a retry attempt: the delay doubles with
/// each attempt (2^attempt * initial_delay), capped at max_delay.
fn backoff_delay(attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
    let multiplier = 2u32.saturating_pow(attempt);
    initial_delay.saturating_mul(multiplier).min(max_delay)
}

/// Executes single deployments and hook calls against a chain client.
pub struct Executor {
    client: Arc<dyn ChainClient>,
    retry: RetryPolicy,
}

impl Executor {
    /// Create an executor over the given chain client.
    pub fn new(client: Arc<dyn ChainClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Deploy one artifact with already-resolved constructor arguments.
    ///
    /// Transport errors (including submission timeouts) are retried with
    /// exponential backoff up to the policy bound. Reverts and retry
    /// exhaustion surface as `DeploymentFailed`.
    pub async fn deploy(
        &self,
        spec: &ArtifactSpec,
        args: &[ResolvedArg],
        network: &str,
    ) -> Result<DeployedArtifact> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match timeout(
                self.retry.submit_timeout,
                self.client.submit(&spec.name, args),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DeployError::Transport {
                    message: format!(
                        "submission not confirmed within {:?}",
                        self.retry.submit_timeout
                    ),
                }),
            };

            match outcome {
                Ok(address) => {
                    info!(artifact = %spec.name, %address, network, "deployed");
                    return Ok(DeployedArtifact::new(&spec.name, address, network));
                }
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay =
                        backoff_delay(attempt, self.retry.initial_delay, self.retry.max_delay);
                    attempt += 1;
                    warn!(
                        artifact = %spec.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    return Err(DeployError::DeploymentFailed {
                        name: spec.name.clone(),
                        cause: err.to_string(),
                    });
                }
            }
        }
    }

    /// Run one post-deploy hook call. Hooks are not retried; a failure is
    /// reported to the caller and never rolls anything back.
    pub async fn call_hook(
        &self,
        hook: &HookSpec,
        target: chainwright_core::Address,
        args: &[ResolvedArg],
    ) -> Result<()> {
        self.client
            .call(target, &hook.method, args)
            .await
            .map_err(|err| DeployError::HookFailed {
                hook: hook.name.clone(),
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chainwright_core::Address;

    /// Client that replays a fixed script of responses.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<Address>>>,
        attempts: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<Address>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainClient for ScriptedClient {
        async fn submit(&self, _name: &str, _args: &[ResolvedArg]) -> Result<Address> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Address::from_low_u64(1)))
        }

        async fn call(&self, _: Address, _: &str, _: &[ResolvedArg]) -> Result<()> {
            Ok(())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            submit_timeout: Duration::from_secs(5),
        }
    }

    fn transport(message: &str) -> DeployError {
        DeployError::Transport {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let initial = Duration::from_millis(500);
        let max = Duration::from_secs(8);
        assert_eq!(backoff_delay(0, initial, max), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, initial, max), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, initial, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(10, initial, max), max);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(transport("timeout")),
            Err(transport("nonce conflict")),
            Ok(Address::from_low_u64(5)),
        ]));
        let executor = Executor::new(client.clone(), fast_policy(3));
        let spec = ArtifactSpec::builder("AccessManager").build();

        let artifact = executor.deploy(&spec, &[], "localhost").await.unwrap();
        assert_eq!(artifact.address, Address::from_low_u64(5));
        assert_eq!(client.attempts(), 3);
    }

    #[tokio::test]
    async fn test_revert_is_not_retried() {
        let client = Arc::new(ScriptedClient::new(vec![Err(DeployError::Revert {
            message: "constructor reverted".to_string(),
        })]));
        let executor = Executor::new(client.clone(), fast_policy(3));
        let spec = ArtifactSpec::builder("AccessManager").build();

        let err = executor.deploy(&spec, &[], "localhost").await.unwrap_err();
        assert!(matches!(err, DeployError::DeploymentFailed { .. }));
        assert_eq!(client.attempts(), 1);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_fails_the_deployment() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(transport("down")),
            Err(transport("down")),
            Err(transport("down")),
        ]));
        let executor = Executor::new(client.clone(), fast_policy(3));
        let spec = ArtifactSpec::builder("TokenManager").build();

        let err = executor.deploy(&spec, &[], "localhost").await.unwrap_err();
        assert_eq!(client.attempts(), 3);
        match err {
            DeployError::DeploymentFailed { name, cause } => {
                assert_eq!(name, "TokenManager");
                assert!(cause.contains("down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hook_failure_is_reported_as_hook_failed() {
        struct FailingCalls;
        #[async_trait]
        impl ChainClient for FailingCalls {
            async fn submit(&self, _: &str, _: &[ResolvedArg]) -> Result<Address> {
                Ok(Address::zero())
            }
            async fn call(&self, _: Address, _: &str, _: &[ResolvedArg]) -> Result<()> {
                Err(DeployError::Revert {
                    message: "missing role".to_string(),
                })
            }
        }

        let executor = Executor::new(Arc::new(FailingCalls), fast_policy(1));
        let hook = HookSpec {
            name: "grant-role".to_string(),
            target: "AccessManager".to_string(),
            method: "grantRole".to_string(),
            args: vec![],
        };

        let err = executor
            .call_hook(&hook, Address::from_low_u64(1), &[])
            .await
            .unwrap_err();
        match err {
            DeployError::HookFailed { hook, message } => {
                assert_eq!(hook, "grant-role");
                assert!(message.contains("missing role"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
