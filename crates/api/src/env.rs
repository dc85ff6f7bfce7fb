use civitas_common::{env_or, EnvVars};

pub struct ApiServerEnv {
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub port: u16,
    /// `memory` runs against the in-process store; anything else uses MongoDB.
    pub store_backend: String,
}

impl ApiServerEnv {
    pub fn uses_memory_store(&self) -> bool {
        self.store_backend.eq_ignore_ascii_case("memory")
    }
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            jwt_secret: env_or("JWT_SECRET", ""),
            jwt_ttl_days: env_or("JWT_TTL_DAYS", "7").parse().unwrap_or(7),
            port: env_or("PORT", "5000").parse().unwrap_or(5000),
            store_backend: env_or("STORE", "mongodb"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "JWT_SECRET" => self.jwt_secret.clone(),
            "JWT_TTL_DAYS" => self.jwt_ttl_days.to_string(),
            "PORT" => self.port.to_string(),
            "STORE" => self.store_backend.clone(),
            _ => panic!("{} is not set", key),
        }
    }
}
