use std::env;

pub const DEFAULT_API_URL: &str = "https://ohwjiuloiufhndviqmoc.supabase.co";
pub const API_KEY_ENV: &str = "SMOLHUB_API_KEY";
pub const API_URL_ENV: &str = "SMOLHUB_API_URL";

/// Connection settings for the SmolHub API.
///
/// Built once at the program boundary; the fetcher never looks at the
/// process environment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Config {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, api_key: non_empty(api_key) }
    }

    /// Combine the candidate values. An explicit key beats the environment
    /// key; empty strings count as unset.
    pub fn resolve(
        explicit_key: Option<String>,
        env_key: Option<String>,
        env_url: Option<String>,
    ) -> Self {
        let api_key = non_empty(explicit_key).or_else(|| non_empty(env_key));
        let base_url = non_empty(env_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base_url, api_key)
    }

    /// Read `SMOLHUB_API_KEY` and `SMOLHUB_API_URL`, letting `explicit_key`
    /// override the former.
    pub fn from_env(explicit_key: Option<String>) -> Self {
        Self::resolve(
            explicit_key,
            env::var(API_KEY_ENV).ok(),
            env::var(API_URL_ENV).ok(),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
