use std::time::Duration;

use clap::{Parser, arg, command};
use log::LevelFilter;

use crate::gateway::RemoteEndpoint;

/// Configuration of the review service, read from command line arguments or environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServiceConfig {
    /// Connection string of the MongoDB deployment.
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: String,

    /// Database holding the `reviews` collection.
    #[arg(long, env = "MONGODB_DATABASE", default_value = "review-database")]
    pub mongodb_database: String,

    /// Port of the REST API.
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// Address of the user service gRPC API.
    #[arg(long, env = "USER_SERVICE_ADDR", default_value = "http://localhost:9091")]
    pub user_service_addr: String,

    /// Address of the movie service gRPC API.
    #[arg(long, env = "MOVIE_SERVICE_ADDR", default_value = "http://localhost:9092")]
    pub movie_service_addr: String,

    #[arg(long, env = "USER_CONNECT_TIMEOUT_MS", default_value_t = 5000)]
    pub user_connect_timeout_ms: u64,

    #[arg(long, env = "USER_CALL_TIMEOUT_MS", default_value_t = 3000)]
    pub user_call_timeout_ms: u64,

    #[arg(long, env = "MOVIE_CONNECT_TIMEOUT_MS", default_value_t = 5000)]
    pub movie_connect_timeout_ms: u64,

    #[arg(long, env = "MOVIE_CALL_TIMEOUT_MS", default_value_t = 3000)]
    pub movie_call_timeout_ms: u64,

    /// Maximum level of log records, one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Exports metrics over OTLP/HTTP.
    #[arg(long, env = "OTLP_METRICS")]
    pub otlp_metrics: bool,
}

impl ServiceConfig {
    /// Endpoint of the user service.
    pub fn user_endpoint(&self) -> RemoteEndpoint {
        RemoteEndpoint {
            address: self.user_service_addr.clone(),
            connect_timeout: Duration::from_millis(self.user_connect_timeout_ms),
            call_timeout: Duration::from_millis(self.user_call_timeout_ms),
        }
    }

    /// Endpoint of the movie service.
    pub fn movie_endpoint(&self) -> RemoteEndpoint {
        RemoteEndpoint {
            address: self.movie_service_addr.clone(),
            connect_timeout: Duration::from_millis(self.movie_connect_timeout_ms),
            call_timeout: Duration::from_millis(self.movie_call_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_everything_but_the_database_uri() {
        let config =
            ServiceConfig::try_parse_from(["review", "--mongodb-uri", "mongodb://localhost:27017"])
                .unwrap();
        assert_eq!(config.mongodb_database, "review-database");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(!config.otlp_metrics);

        let movies = config.movie_endpoint();
        assert_eq!(movies.address, "http://localhost:9092");
        assert_eq!(movies.connect_timeout, Duration::from_secs(5));
        assert_eq!(movies.call_timeout, Duration::from_secs(3));
        assert_eq!(config.user_endpoint().address, "http://localhost:9091");
    }

    #[test]
    fn arguments_override_defaults() {
        let config = ServiceConfig::try_parse_from([
            "review",
            "--mongodb-uri",
            "mongodb://db:27017",
            "--user-call-timeout-ms",
            "250",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.user_endpoint().call_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level, LevelFilter::Debug);
    }
}
