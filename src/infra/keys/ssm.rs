use anyhow::{Context, Result, bail};
use aws_sdk_ssm::types::Parameter;

use super::KeyStore;

/// Reads the feed API key from AWS SSM Parameter Store.
///
/// The key is usually a `SecureString`, so it is fetched with decryption on;
/// the role needs `ssm:GetParameter` plus `kms:Decrypt` on the parameter's key.
pub struct SsmKeyStore {
    client: aws_sdk_ssm::Client,
}

impl SsmKeyStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

/// Pulls the API key out of a `GetParameter` response. A blank value would only
/// surface later as a rejected feed request, so it is refused here.
fn api_key_value(reference: &str, parameter: Option<Parameter>) -> Result<String> {
    let Some(parameter) = parameter else {
        bail!("feed API key parameter '{reference}' was not returned");
    };
    let source = parameter.arn().unwrap_or(reference).to_string();
    match parameter.value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("feed API key parameter '{source}' has no value"),
    }
}

#[async_trait::async_trait]
impl KeyStore for SsmKeyStore {
    /// `reference` is a parameter name such as `/gtfs/api_key` or a full
    /// parameter ARN.
    #[tracing::instrument(skip_all, fields(parameter = %reference))]
    async fn get(&self, reference: &str) -> Result<String> {
        let resp = self
            .client
            .get_parameter()
            .name(reference)
            .with_decryption(true)
            .send()
            .await
            .with_context(|| format!("could not read feed API key from SSM parameter '{reference}'"))?;

        api_key_value(reference, resp.parameter)
    }
}
