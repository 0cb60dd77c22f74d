use secrecy::SecretString;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub payment_base_url: String,
    pub payment_client_id: String,
    pub payment_client_secret: SecretString,
    pub question_cache_ttl_minutes: u64,
    pub question_cache_max_entries: usize,
    pub payment_hold_minutes: i64,
    pub hold_sweep_interval_secs: u64,
    pub access_token_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "talent-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            payment_base_url: env::var("PAYMENT_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.cashfree.com".to_string()),
            payment_client_id: env::var("PAYMENT_CLIENT_ID")
                .unwrap_or_else(|_| "payment_client_id".to_string()),
            payment_client_secret: SecretString::from(
                env::var("PAYMENT_CLIENT_SECRET")
                    .unwrap_or_else(|_| "payment_client_secret".to_string()),
            ),
            // must outlast the longest exam window so the answer key never
            // expires mid-exam
            question_cache_ttl_minutes: env::var("QUESTION_CACHE_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            question_cache_max_entries: env::var("QUESTION_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            payment_hold_minutes: env::var("PAYMENT_HOLD_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            hold_sweep_interval_secs: env::var("HOLD_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let payment_secret = self.payment_client_secret.expose_secret();

        if payment_secret == "payment_client_secret" {
            panic!(
                "FATAL: PAYMENT_CLIENT_SECRET is using default value! Set PAYMENT_CLIENT_SECRET environment variable."
            );
        }

        if self.payment_client_id == "payment_client_id" {
            panic!(
                "FATAL: PAYMENT_CLIENT_ID is using default value! Set PAYMENT_CLIENT_ID environment variable."
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "talent-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            payment_base_url: "http://localhost:9999".to_string(),
            payment_client_id: "test_client_id".to_string(),
            payment_client_secret: SecretString::from("test_client_secret".to_string()),
            question_cache_ttl_minutes: 90,
            question_cache_max_entries: 8,
            payment_hold_minutes: 30,
            hold_sweep_interval_secs: 60,
            access_token_ttl_minutes: 15,
        }
    }
}
