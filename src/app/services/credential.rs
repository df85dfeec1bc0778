//! Provider credential renewal
//!
//! Runs the external login command once. The command stores the refreshed
//! token itself; only its exit status matters here. There is no retry: a
//! failure is fatal for the run that requested it.

use super::process_runner::{CommandRunner, Invocation};
use crate::config::Config;
use crate::{Error, Result};
use tracing::{error, info};

/// Renews the provider credential through the configured login command
#[derive(Debug, Clone)]
pub struct CredentialRefresher {
    invocation: Invocation,
}

impl CredentialRefresher {
    /// Build from the `[credential]` section; runs from the pipeline work dir
    pub fn from_config(config: &Config) -> Result<Self> {
        let invocation =
            Invocation::from_command(&config.credential.command, config.credential.timeout())?
                .in_dir(&config.pipeline.work_dir);
        Ok(Self { invocation })
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Run the login command; any failure maps to [`Error::CredentialRefresh`]
    pub async fn refresh(&self, runner: &dyn CommandRunner) -> Result<()> {
        info!("Renewing provider credential");

        let output = runner
            .run(&self.invocation)
            .await
            .map_err(|e| Error::credential_refresh(e.to_string()))?;

        if output.success() {
            info!("Credential renewed");
            Ok(())
        } else {
            let reason = output.failure_summary();
            error!("Login command failed: {}", reason);
            Err(Error::credential_refresh(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::process_runner::ProcessOutput;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedRunner(std::result::Result<ProcessOutput, fn() -> Error>);

    #[async_trait]
    impl CommandRunner for FixedRunner {
        async fn run(&self, _invocation: &Invocation) -> Result<ProcessOutput> {
            match &self.0 {
                Ok(output) => Ok(output.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    #[test]
    fn test_uses_configured_command_and_timeout() {
        let mut config = Config::default();
        config.credential.command = vec!["/opt/sungrow/login".to_string()];
        config.credential.timeout_secs = 30;

        let refresher = CredentialRefresher::from_config(&config).unwrap();
        assert_eq!(refresher.invocation().program, "/opt/sungrow/login");
        assert!(refresher.invocation().args.is_empty());
        assert_eq!(refresher.invocation().timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let refresher = CredentialRefresher::from_config(&Config::default()).unwrap();
        let runner = FixedRunner(Ok(ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        }));

        assert!(refresher.refresh(&runner).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_credential_error() {
        let refresher = CredentialRefresher::from_config(&Config::default()).unwrap();
        let runner = FixedRunner(Ok(ProcessOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "invalid password".to_string(),
        }));

        match refresher.refresh(&runner).await {
            Err(Error::CredentialRefresh { reason }) => {
                assert!(reason.contains("invalid password"));
            }
            other => panic!("Expected CredentialRefresh error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_credential_error() {
        let refresher = CredentialRefresher::from_config(&Config::default()).unwrap();
        let runner = FixedRunner(Err(|| Error::process_timeout("python3", 60)));

        assert!(matches!(
            refresher.refresh(&runner).await,
            Err(Error::CredentialRefresh { .. })
        ));
    }
}
