//! Command-line flags.
//!
//! Flags mirror the balancer's historical interface (`--hosts "a:1;b:2"`,
//! millisecond durations) and override values read from `--config`.

use clap::Parser;
use std::path::PathBuf;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{BalanceMode, BalancerConfig};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "round-robin-balancer")]
#[command(version, about = "HTTP load balancer with active health checks", long_about = None)]
pub struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Balancer address
    #[arg(long)]
    pub address: Option<String>,

    /// List of hosts or IPs, delimited with ;
    #[arg(long)]
    pub hosts: Option<String>,

    /// Health check endpoint on hosts, provide HTTP 200 OK if healthy
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Time in ms, repeat interval
    #[arg(long)]
    pub interval: Option<u64>,

    /// Time in ms, health check timeout
    #[arg(long = "health_timeout")]
    pub health_timeout: Option<u64>,

    /// Time in ms, proxy connect timeout
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Proxy balancing, one of: round_robin, disable
    #[arg(long)]
    pub balance: Option<BalanceMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Build the validated configuration: defaults, then file, then flags.
    pub fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BalancerConfig::default(),
        };

        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut BalancerConfig) {
        if let Some(address) = self.address {
            config.listener.bind_address = address;
        }
        if let Some(hosts) = self.hosts {
            config.hosts = split_hosts(&hosts);
        }
        if let Some(endpoint) = self.endpoint {
            config.health_check.path = endpoint;
        }
        if let Some(interval) = self.interval {
            config.health_check.interval_ms = interval;
        }
        if let Some(timeout) = self.health_timeout {
            config.health_check.timeout_ms = timeout;
        }
        if let Some(timeout) = self.timeout {
            config.timeouts.forward_ms = timeout;
        }
        if let Some(balance) = self.balance {
            config.balance = balance;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

/// Split a `;`-delimited host list, trimming entries and dropping blanks.
pub fn split_hosts(hosts: &str) -> Vec<String> {
    hosts
        .split(';')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::ValidationError;

    #[test]
    fn test_split_hosts() {
        assert_eq!(
            split_hosts(" 10.0.0.1:80; 10.0.0.2:80 ;;10.0.0.3:80; "),
            vec!["10.0.0.1:80", "10.0.0.2:80", "10.0.0.3:80"]
        );
        assert!(split_hosts(" ; ").is_empty());
    }

    #[test]
    fn test_flags_build_config() {
        let cli = Cli::try_parse_from([
            "round-robin-balancer",
            "--address",
            ":9000",
            "--hosts",
            "127.0.0.1:3000;127.0.0.1:3001",
            "--endpoint",
            "/status",
            "--interval",
            "200",
            "--health_timeout",
            "50",
            "--timeout",
            "700",
            "--balance",
            "disable",
        ])
        .unwrap();

        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.bind_address, ":9000");
        assert_eq!(config.hosts, vec!["127.0.0.1:3000", "127.0.0.1:3001"]);
        assert_eq!(config.health_check.path, "/status");
        assert_eq!(config.health_check.interval_ms, 200);
        assert_eq!(config.health_check.timeout_ms, 50);
        assert_eq!(config.timeouts.forward_ms, 700);
        assert_eq!(config.balance, BalanceMode::Disable);
    }

    #[test]
    fn test_unknown_balance_flag_rejected() {
        let result = Cli::try_parse_from([
            "round-robin-balancer",
            "--hosts",
            "127.0.0.1:3000",
            "--balance",
            "weighted",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_interval_flag_fails_validation() {
        let cli = Cli::try_parse_from([
            "round-robin-balancer",
            "--hosts",
            "127.0.0.1:3000",
            "--interval",
            "0",
        ])
        .unwrap();

        match cli.into_config() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroInterval]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_hosts_fails_validation() {
        let cli = Cli::try_parse_from(["round-robin-balancer"]).unwrap();
        assert!(matches!(cli.into_config(), Err(ConfigError::Validation(_))));
    }
}
