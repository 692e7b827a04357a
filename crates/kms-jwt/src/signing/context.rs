use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Identifies the remote key a sign or verify call should use.
///
/// `key_path` is a fully-qualified key-version name such as
/// `projects/p/locations/l/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1`, or a
/// crypto-key name without a version, in which case the primary version is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsConfig {
    pub key_path: String,
}

impl KmsConfig {
    pub fn new(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }
}

/// Execution context handed to KMS-backed signing methods in place of a key.
///
/// Carries the caller's cancellation token, which is passed through to the
/// remote signer untouched, and at most one attached [`KmsConfig`].
#[derive(Debug, Clone, Default)]
pub struct KmsContext {
    cancel: CancellationToken,
    config: Option<Arc<KmsConfig>>,
}

impl KmsContext {
    /// A context with no config and a token nobody cancels.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            config: None,
        }
    }

    /// Returns a copy of this context carrying `config`, replacing any config
    /// already attached. The cancellation token is shared with `self`.
    pub fn with_config(&self, config: KmsConfig) -> Self {
        Self {
            cancel: self.cancel.clone(),
            config: Some(Arc::new(config)),
        }
    }

    pub fn config(&self) -> Option<&KmsConfig> {
        self.config.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Attaches `config` to `ctx`. See [`KmsContext::with_config`].
pub fn attach_config(ctx: &KmsContext, config: KmsConfig) -> KmsContext {
    ctx.with_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_no_config() {
        assert!(KmsContext::background().config().is_none());
    }

    #[test]
    fn attached_config_is_recovered() {
        let ctx = attach_config(&KmsContext::background(), KmsConfig::new("ring/key"));
        assert_eq!(ctx.config(), Some(&KmsConfig::new("ring/key")));
    }

    #[test]
    fn attaching_leaves_parent_untouched() {
        let parent = KmsContext::background().with_config(KmsConfig::new("a"));
        let child = parent.with_config(KmsConfig::new("b"));
        assert_eq!(parent.config().unwrap().key_path, "a");
        assert_eq!(child.config().unwrap().key_path, "b");
    }

    #[test]
    fn cancellation_is_shared_with_derived_contexts() {
        let token = CancellationToken::new();
        let ctx = KmsContext::with_cancellation(token.clone()).with_config(KmsConfig::new("a"));
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn config_deserializes_from_json() {
        let config: KmsConfig = serde_json::from_str(r#"{"key_path":"ring/key"}"#).unwrap();
        assert_eq!(config, KmsConfig::new("ring/key"));
    }
}
