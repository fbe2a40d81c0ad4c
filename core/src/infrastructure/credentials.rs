use crate::domain::food_analysis::ports::CredentialSource;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Credential fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource {
    api_key: Option<String>,
}

impl StaticCredentialSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }
}

impl CredentialSource for StaticCredentialSource {
    fn api_key(&self) -> Option<String> {
        normalize(self.api_key.as_deref())
    }
}

/// Reads the credential from an environment variable on every request, so a
/// key exported after startup is picked up.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new(GEMINI_API_KEY_VAR)
    }
}

impl CredentialSource for EnvCredentialSource {
    fn api_key(&self) -> Option<String> {
        normalize(std::env::var(&self.var).ok().as_deref())
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
