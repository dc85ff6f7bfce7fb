use civitas_common::{env_or, EnvVars};

pub struct MongoDbEnv {
    pub mongodb_uri: String,
    pub mongodb_db_name: String,
}

impl EnvVars for MongoDbEnv {
    fn load() -> Self {
        Self {
            mongodb_uri: env_or("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_db_name: env_or("MONGODB_DB_NAME", "civitas"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "MONGODB_URI" => self.mongodb_uri.clone(),
            "MONGODB_DB_NAME" => self.mongodb_db_name.clone(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
