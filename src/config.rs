use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Already-authenticated connection string handed to every session
    pub connection_string: Option<String>,
    /// JSON file with the models to load into the in-memory engine
    pub model_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            model_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables with prefix "TABULAR_"
        config = config.add_source(
            config::Environment::with_prefix("TABULAR")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the engine connection string from config or environment
    pub fn connection_string(&self) -> String {
        if let Some(connection_string) = &self.engine.connection_string {
            return connection_string.clone();
        }

        // Fall back to environment variable
        if let Ok(connection_string) = std::env::var("ENGINE_CONNECTION_STRING") {
            return connection_string;
        }

        // Default for local development
        "Data Source=localhost".to_string()
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
        assert!(config.engine.model_path.is_none());
    }

    #[test]
    fn test_configured_connection_string_wins() {
        let mut config = AppConfig::default();
        config.engine.connection_string = Some("Data Source=powerbi://api.powerbi.com".to_string());
        assert_eq!(
            config.connection_string(),
            "Data Source=powerbi://api.powerbi.com"
        );
    }
}
