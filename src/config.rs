use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub firestore_url: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub request_timeout_secs: u64,
    pub always_ack_provider: bool,
}

impl Config {
    /// Loads configuration from the environment. Missing store credentials fail
    /// startup instead of proceeding with unusable clients.
    pub fn from_env() -> Result<Config, String> {
        let firestore_url = env::var("FIRESTORE_URL")
            .map_err(|_| String::from("FIRESTORE_URL environment variable is required"))?;
        let supabase_url = env::var("SUPABASE_URL")
            .map_err(|_| String::from("SUPABASE_URL environment variable is required"))?;
        let supabase_service_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| String::from("SUPABASE_SERVICE_ROLE_KEY environment variable is required"))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| String::from("8080"))
            .parse()
            .map_err(|_| String::from("PORT must be a valid port number"))?;
        let request_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| String::from("30"))
            .parse()
            .map_err(|_| String::from("HTTP_TIMEOUT_SECS must be a number of seconds"))?;
        let always_ack_provider = env::var("ALWAYS_ACK_PROVIDER")
            .unwrap_or_else(|_| String::from("true"))
            .parse()
            .map_err(|_| String::from("ALWAYS_ACK_PROVIDER must be true or false"))?;

        Ok(Config {
            port: port,
            firestore_url: firestore_url,
            supabase_url: supabase_url,
            supabase_service_key: supabase_service_key,
            request_timeout_secs: request_timeout_secs,
            always_ack_provider: always_ack_provider,
        })
    }
}
