//! Server configuration: environment first, then command-line overrides.
//! Set but unparsable values are rejected at startup.
//!
//! | Variable          | Default   | Meaning                               |
//! |-------------------|-----------|---------------------------------------|
//! | `ORCA_HOST`       | `0.0.0.0` | bind address                          |
//! | `ORCA_PORT`       | `8080`    | bind port                             |
//! | `ORCA_LOG`        | `info`    | tracing filter (falls back to `RUST_LOG`) |
//! | `ORCA_MAX_REQUEST`| `65536`   | largest accepted request, in bytes    |
//! | `ORCA_STATS_SECS` | `0`       | stats log period, `0` disables        |
//! | `ORCA_SEED`       | `true`    | preload demo menus                    |

use std::str::FromStr;

use crate::ServerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_filter: String,
    pub max_request: usize,
    pub stats_secs: u64,
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_filter: "info".to_string(),
            max_request: 64 * 1024,
            stats_secs: 0,
            seed: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. A variable that is set but does not
    /// parse is an error rather than a silent default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let log_filter = lookup("ORCA_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or(d.log_filter);
        Ok(Self {
            host: lookup("ORCA_HOST").unwrap_or(d.host),
            port: var(&lookup, "ORCA_PORT", d.port)?,
            log_filter,
            max_request: var(&lookup, "ORCA_MAX_REQUEST", d.max_request)?,
            stats_secs: var(&lookup, "ORCA_STATS_SECS", d.stats_secs)?,
            seed: flag(&lookup, "ORCA_SEED", d.seed)?,
        })
    }

    /// Apply `--port/-p`, `--host`, `--log` and `--no-seed`.
    /// A bare number is taken as the port.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => self.port = parse_value(&arg, args.next())?,
                "--host" => self.host = parse_value(&arg, args.next())?,
                "--log" => self.log_filter = parse_value(&arg, args.next())?,
                "--no-seed" => self.seed = false,
                s if s.parse::<u16>().is_ok() => self.port = parse_value(s, Some(s.to_string()))?,
                other => {
                    return Err(ServerError::InvalidArg {
                        arg: other.to_string(),
                        reason: "unknown option".to_string(),
                    })
                }
            }
        }
        Ok(self)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => parse_value(key, Some(value)),
        None => Ok(default),
    }
}

/// `1 true yes on` and `0 false no off`, any case.
fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServerError::InvalidArg {
            arg: key.to_string(),
            reason: format!("expected a boolean, got `{}`", value),
        }),
    }
}

fn parse_value<T: FromStr>(flag: &str, value: Option<String>) -> Result<T, ServerError> {
    let value = value.ok_or_else(|| ServerError::InvalidArg {
        arg: flag.to_string(),
        reason: "missing value".to_string(),
    })?;
    value.parse().map_err(|_| ServerError::InvalidArg {
        arg: flag.to_string(),
        reason: format!("cannot parse `{}`", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let cfg = ServerConfig::from_lookup(vars(&[])).unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = ServerConfig::from_lookup(vars(&[
            ("ORCA_HOST", "127.0.0.1"),
            ("ORCA_PORT", "9090"),
            ("RUST_LOG", "debug"),
            ("ORCA_STATS_SECS", "5"),
            ("ORCA_SEED", "OFF"),
        ]))
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9090");
        assert_eq!(cfg.log_filter, "debug");
        assert_eq!(cfg.stats_secs, 5);
        assert!(!cfg.seed);

        let cfg = ServerConfig::from_lookup(vars(&[("ORCA_LOG", "warn"), ("RUST_LOG", "debug")])).unwrap();
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn unparsable_variables_are_errors() {
        let err = ServerConfig::from_lookup(vars(&[("ORCA_PORT", "ninety")])).unwrap_err();
        assert!(err.to_string().contains("ORCA_PORT"), "got: {err}");

        let err = ServerConfig::from_lookup(vars(&[("ORCA_SEED", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("boolean"), "got: {err}");
    }

    #[test]
    fn args_override() {
        let cfg = ServerConfig::default()
            .with_args(args(&["--port", "9000", "--host", "127.0.0.1", "--no-seed"]))
            .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert!(!cfg.seed);
    }

    #[test]
    fn bare_number_is_port() {
        let cfg = ServerConfig::default().with_args(args(&["8181"])).unwrap();
        assert_eq!(cfg.port, 8181);
    }

    #[test]
    fn bad_args_are_errors() {
        let err = ServerConfig::default()
            .with_args(args(&["-p", "http"]))
            .unwrap_err();
        assert!(err.to_string().contains("-p"), "got: {err}");

        let err = ServerConfig::default().with_args(args(&["--port"])).unwrap_err();
        assert!(err.to_string().contains("missing value"), "got: {err}");

        assert!(ServerConfig::default().with_args(args(&["--frobnicate"])).is_err());
    }
}
