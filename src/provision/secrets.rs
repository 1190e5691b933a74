//! Hub id lookup from a secret shared by another account.

use super::cli;
use crate::error::{TopologyError, TopologyResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// JSON key holding the hub id inside the secret string.
pub const HUB_ID_KEY: &str = "id";

static PARTIAL_ARN_REGEX: OnceLock<Regex> = OnceLock::new();
static SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn partial_arn_regex() -> &'static Regex {
    PARTIAL_ARN_REGEX.get_or_init(|| {
        Regex::new(r"^arn:aws[a-z-]*:secretsmanager:[a-z0-9-]+:\d{12}:secret:[A-Za-z0-9/_+=.@-]+$")
            .expect("Invalid Regex")
    })
}

fn suffix_regex() -> &'static Regex {
    SUFFIX_REGEX.get_or_init(|| Regex::new(r"-[A-Za-z0-9]{6}$").expect("Invalid Regex"))
}

/// Check the shape of a partial secret ARN.
///
/// A trailing `-XXXXXX` looks like the random suffix the platform appends to
/// full ARNs; it is accepted but logged because lookups by partial ARN with a
/// suffix attached usually fail.
pub fn validate_partial_arn(partial_arn: &str) -> TopologyResult<()> {
    if !partial_arn_regex().is_match(partial_arn) {
        return Err(TopologyError::SecretResolutionFailed {
            secret: partial_arn.to_string(),
            reason: "not a secretsmanager ARN".to_string(),
        });
    }
    if suffix_regex().is_match(partial_arn) {
        log::warn!("secret ARN {partial_arn} looks like a full ARN with a random suffix");
    }
    Ok(())
}

/// Extract the hub id from a secret string such as `{"id":"tgw-0abc"}`.
pub fn hub_id_from_secret_string(secret: &str, secret_string: &str) -> TopologyResult<String> {
    let value: serde_json::Value = serde_json::from_str(secret_string.trim()).map_err(|e| {
        TopologyError::SecretResolutionFailed {
            secret: secret.to_string(),
            reason: format!("secret is not JSON: {e}"),
        }
    })?;
    value
        .get(HUB_ID_KEY)
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .ok_or_else(|| TopologyError::SecretResolutionFailed {
            secret: secret.to_string(),
            reason: format!("secret has no '{HUB_ID_KEY}' key"),
        })
}

/// Resolves a shared secret reference to a hub id.
///
/// Failures are fatal; no retries happen here.
pub trait SecretResolver {
    fn resolve_hub_id(&self, partial_arn: &str) -> TopologyResult<String>;
}

/// Reads the secret through the `aws` CLI.
#[derive(Debug, Default, Clone)]
pub struct AwsCliSecretResolver {
    /// Optional named profile passed as `--profile`.
    pub profile: Option<String>,
}

impl SecretResolver for AwsCliSecretResolver {
    fn resolve_hub_id(&self, partial_arn: &str) -> TopologyResult<String> {
        validate_partial_arn(partial_arn)?;
        let profile = self
            .profile
            .as_ref()
            .map(|p| format!(" --profile {p}"))
            .unwrap_or_default();
        let cmd = format!(
            "aws secretsmanager get-secret-value --secret-id '{partial_arn}' --query SecretString --output text{profile}"
        );
        let output = cli::run(&cmd).map_err(|e| TopologyError::SecretResolutionFailed {
            secret: partial_arn.to_string(),
            reason: e.to_string(),
        })?;
        let hub_id = hub_id_from_secret_string(partial_arn, &output)?;
        log::info!("resolved hub id {hub_id} from {partial_arn}");
        Ok(hub_id)
    }
}

/// In-memory secret values keyed by partial ARN.
#[derive(Debug, Default, Clone)]
pub struct StaticSecretResolver {
    values: HashMap<String, String>,
}

impl StaticSecretResolver {
    pub fn new() -> StaticSecretResolver {
        StaticSecretResolver::default()
    }

    /// Register the hub id stored behind `partial_arn`.
    pub fn with_hub_id(mut self, partial_arn: &str, hub_id: &str) -> StaticSecretResolver {
        self.values
            .insert(partial_arn.to_string(), hub_id.to_string());
        self
    }
}

impl SecretResolver for StaticSecretResolver {
    fn resolve_hub_id(&self, partial_arn: &str) -> TopologyResult<String> {
        self.values
            .get(partial_arn)
            .cloned()
            .ok_or_else(|| TopologyError::SecretResolutionFailed {
                secret: partial_arn.to_string(),
                reason: "secret not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:secretsmanager:us-east-1:222222222222:secret:transitGateway";

    #[test]
    fn test_validate_partial_arn() {
        assert!(validate_partial_arn(ARN).is_ok());
        assert!(validate_partial_arn("arn:aws:secretsmanager:us-east-1:222222222222:secret:transitGateway-AJdbCL").is_ok());
        assert!(matches!(
            validate_partial_arn("arn:aws:s3:::bucket"),
            Err(TopologyError::SecretResolutionFailed { .. })
        ));
    }

    #[test]
    fn test_hub_id_from_secret_string() {
        assert_eq!(
            hub_id_from_secret_string(ARN, "{\"id\":\"tgw-0abc\"}\n").unwrap(),
            "tgw-0abc"
        );
        assert!(hub_id_from_secret_string(ARN, "{\"name\":\"tgw\"}").is_err());
        assert!(hub_id_from_secret_string(ARN, "{\"id\":\"\"}").is_err());
        assert!(hub_id_from_secret_string(ARN, "tgw-0abc").is_err());
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticSecretResolver::new().with_hub_id(ARN, "tgw-0abc");
        assert_eq!(resolver.resolve_hub_id(ARN).unwrap(), "tgw-0abc");
        assert!(matches!(
            resolver.resolve_hub_id("arn:aws:secretsmanager:us-east-1:222222222222:secret:other"),
            Err(TopologyError::SecretResolutionFailed { .. })
        ));
    }
}
