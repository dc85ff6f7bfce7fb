pub trait EnvVars {
    fn load() -> Self;
    fn get_env_var(&self, key: &str) -> String;
}

/// Reads `key`, falling back to `default` when it is unset or blank.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
