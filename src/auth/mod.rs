pub mod providers;

use crate::error::{NyayError, Result};
use providers::{Provider, ResolvedProvider};

/// Provider-related settings gathered from the config file, env and CLI
/// before resolution. `None` means "use the provider default".
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    /// Key from the config file; the provider's env var wins over it.
    pub api_key: Option<String>,
}

/// Resolve the language-model provider.
///
/// Precedence for the key: provider env var > config file. An unknown
/// provider name is a configuration error; a missing key is not checked
/// here (see [`require_credentials`]) so that commands which never call the
/// model can still run.
pub fn resolve_provider(
    request: &ProviderRequest,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedProvider> {
    let provider = match request.provider.as_deref() {
        Some(name) => Provider::from_str_loose(name)
            .ok_or_else(|| NyayError::Configuration(format!("Unknown LLM provider: {}", name)))?,
        None => Provider::Groq,
    };

    let api_key = if provider.env_var_name().is_empty() {
        None
    } else {
        env(provider.env_var_name())
    }
    .or_else(|| request.api_key.clone())
    .filter(|k| !k.trim().is_empty());

    let endpoint = request
        .endpoint
        .clone()
        .unwrap_or_else(|| provider.default_endpoint().to_string());

    let model = request
        .model
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| provider.default_model().to_string());

    Ok(ResolvedProvider {
        provider,
        endpoint,
        model,
        api_key,
    })
}

/// Fail fast before any network call when the provider needs a key and has none.
pub fn require_credentials(resolved: &ResolvedProvider) -> Result<()> {
    if resolved.provider.requires_auth() && resolved.api_key.is_none() {
        return Err(NyayError::Configuration(format!(
            "{} requires an API key. Set {} or add llm_api_key to the config file.",
            resolved.provider.display_name(),
            resolved.provider.env_var_name()
        )));
    }
    if resolved.model.trim().is_empty() {
        return Err(NyayError::Configuration("No LLM model name configured".into()));
    }
    Ok(())
}
