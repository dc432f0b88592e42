mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use crate::logs::LogSource;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./scenemend.toml",
        "~/.config/scenemend/config.toml",
        "/etc/scenemend/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

impl Config {
    /// Fold command-line and environment values into the loaded file.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        // An explicit source replaces whatever the file configured.
        if let Some(file) = &overrides.log_file {
            self.source = SourceConfig {
                file: Some(file.clone()),
                ..self.source.without_inputs()
            };
        } else if overrides.stdin {
            self.source = SourceConfig {
                stdin: true,
                ..self.source.without_inputs()
            };
        } else if let Some(container) = &overrides.container {
            self.source = SourceConfig {
                container: Some(container.clone()),
                ..self.source.without_inputs()
            };
        }

        self.override_arr(
            ArrType::Radarr,
            overrides.radarr_host.as_deref(),
            overrides.radarr_key.as_deref(),
        );
        self.override_arr(
            ArrType::Sonarr,
            overrides.sonarr_host.as_deref(),
            overrides.sonarr_key.as_deref(),
        );
    }

    fn override_arr(&mut self, arr_type: ArrType, url: Option<&str>, api_key: Option<&str>) {
        if url.is_none() && api_key.is_none() {
            return;
        }

        let index = match self.arrs.iter().position(|a| a.arr_type == arr_type) {
            Some(index) => index,
            None => {
                self.arrs.push(ArrConfig {
                    name: arr_type.to_string(),
                    arr_type,
                    url: String::new(),
                    api_key: String::new(),
                    enabled: true,
                    request_timeout_secs: types::default_request_timeout(),
                });
                self.arrs.len() - 1
            }
        };

        let arr = &mut self.arrs[index];
        if let Some(url) = url {
            arr.url = url.to_string();
        }
        if let Some(api_key) = api_key {
            arr.api_key = api_key.to_string();
        }
    }

    /// The single log source configured for this run.
    pub fn log_source(&self) -> Result<LogSource> {
        let source = &self.source;
        let mut candidates = Vec::new();

        if let Some(container) = &source.container {
            candidates.push(LogSource::Docker {
                container: container.clone(),
            });
        }
        if let Some(file) = &source.file {
            candidates.push(LogSource::File(file.clone()));
        }
        if source.stdin {
            candidates.push(LogSource::Stdin);
        }

        match candidates.len() {
            0 => anyhow::bail!(
                "No log source configured: set source.container (BAZARR_CONTAINER), source.file or source.stdin"
            ),
            1 => Ok(candidates.remove(0)),
            _ => anyhow::bail!(
                "Multiple log sources configured ({}); choose one",
                candidates
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Enabled catalogs of the given type.
    pub fn enabled_arrs(&self, arr_type: ArrType) -> impl Iterator<Item = &ArrConfig> {
        self.arrs
            .iter()
            .filter(move |a| a.enabled && a.arr_type == arr_type)
    }

    /// Check everything a remediation run needs: a log source and one
    /// enabled catalog of each kind with credentials.
    pub fn ensure_runnable(&self) -> Result<()> {
        validate_config(self)?;
        self.log_source()?;

        for arr_type in [ArrType::Radarr, ArrType::Sonarr] {
            if self.enabled_arrs(arr_type).next().is_none() {
                let prefix = arr_type.to_string().to_uppercase();
                anyhow::bail!(
                    "No enabled {} configured (set [[arrs]] or {}_HOST and {}_KEY)",
                    arr_type,
                    prefix,
                    prefix
                );
            }
        }

        Ok(())
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    for arr in &config.arrs {
        if !arr.enabled {
            continue;
        }
        if arr.url.trim().is_empty() {
            anyhow::bail!("Arr '{}' is enabled but has no URL", arr.name);
        }
        if arr.api_key.is_empty() {
            anyhow::bail!("Arr '{}' is enabled but has no API key", arr.name);
        }
        if arr.request_timeout_secs == 0 {
            anyhow::bail!("Arr '{}' has a zero request timeout", arr.name);
        }
    }

    if config.retry.attempts == 0 {
        anyhow::bail!("retry.attempts must be at least 1");
    }

    if config.source.origin.trim().is_empty() {
        anyhow::bail!("source.origin cannot be empty");
    }

    for (i, rule) in config.rules.iter().enumerate() {
        if rule.pattern.is_empty() {
            anyhow::bail!("rules[{}] has an empty pattern", i);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ActionNode;
    use std::path::PathBuf;

    const FULL_CONFIG: &str = r#"
        strict_patterns = true

        [source]
        container = "bazarr"

        [[arrs]]
        name = "movies"
        type = "radarr"
        url = "http://radarr:7878/"
        api_key = "abc"

        [[arrs]]
        name = "shows"
        type = "sonarr"
        url = "http://sonarr:8989"
        api_key = "def"

        [retry]
        attempts = 5
        delay_ms = 250

        [remediation]
        mount_point = "/mnt/disc"
        repair_strategy = "stream_copy"

        [[rules]]
        name = "bad extension"
        pattern = "is not a valid video extension"
        action = ["BLACKLIST", { REMUX = { success = "DELETE", fail = "REPLACE" } }]
    "#;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();
        assert!(config.strict_patterns);
        assert_eq!(config.source.origin, "BAZARR");
        assert_eq!(config.arrs.len(), 2);
        assert_eq!(config.arrs[0].arr_type, ArrType::Radarr);
        assert!(config.arrs[0].enabled);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.remediation.mount_point, PathBuf::from("/mnt/disc"));
        assert_eq!(
            config.remediation.repair_strategy,
            RepairStrategy::StreamCopy
        );
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].action.nodes()[0], ActionNode::Blacklist);
        config.ensure_runnable().unwrap();
    }

    #[test]
    fn defaults_are_sensible() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.delay_ms, 5_000);
        assert_eq!(config.remediation.mount_point, PathBuf::from("/mnt/iso"));
        assert_eq!(
            config.remediation.repair_strategy,
            RepairStrategy::Transcode
        );
        assert!(config.rules.is_empty());
    }

    #[test]
    fn overrides_fill_missing_arrs() {
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            container: Some("bazarr".into()),
            radarr_host: Some("http://localhost:7878".into()),
            radarr_key: Some("rk".into()),
            sonarr_host: Some("http://localhost:8989".into()),
            sonarr_key: Some("sk".into()),
            ..Default::default()
        });

        assert_eq!(config.arrs.len(), 2);
        assert_eq!(config.arrs[1].arr_type, ArrType::Sonarr);
        assert_eq!(config.arrs[1].api_key, "sk");
        config.ensure_runnable().unwrap();

        let from_file: ArrConfig =
            toml::from_str("name = \"r\"\ntype = \"radarr\"\nurl = \"u\"\napi_key = \"k\"")
                .unwrap();
        assert_eq!(
            config.arrs[0].request_timeout_secs,
            from_file.request_timeout_secs
        );
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: Config = toml::from_str(FULL_CONFIG).unwrap();
        config.apply_overrides(&ConfigOverrides {
            radarr_key: Some("new-key".into()),
            ..Default::default()
        });
        assert_eq!(config.arrs.len(), 2);
        assert_eq!(config.arrs[0].api_key, "new-key");
        assert_eq!(config.arrs[0].url, "http://radarr:7878/");
    }

    #[test]
    fn explicit_log_file_replaces_container() {
        let mut config: Config = toml::from_str(FULL_CONFIG).unwrap();
        config.apply_overrides(&ConfigOverrides {
            container: Some("bazarr".into()),
            log_file: Some(PathBuf::from("/var/log/bazarr.log")),
            ..Default::default()
        });
        assert_eq!(
            config.log_source().unwrap(),
            LogSource::File(PathBuf::from("/var/log/bazarr.log"))
        );
    }

    #[test]
    fn missing_catalog_is_fatal() {
        let mut config = Config::default();
        config.source.container = Some("bazarr".into());
        config.apply_overrides(&ConfigOverrides {
            radarr_host: Some("http://localhost:7878".into()),
            radarr_key: Some("rk".into()),
            ..Default::default()
        });

        let err = config.ensure_runnable().unwrap_err();
        assert!(err.to_string().contains("sonarr"));
    }

    #[test]
    fn missing_log_source_is_fatal() {
        let config = Config::default();
        let err = config.log_source().unwrap_err();
        assert!(err.to_string().contains("No log source"));
    }

    #[test]
    fn conflicting_log_sources_are_fatal() {
        let mut config = Config::default();
        config.source.container = Some("bazarr".into());
        config.source.stdin = true;
        assert!(config.log_source().is_err());
    }

    #[test]
    fn enabled_arr_without_key_is_rejected() {
        let toml = r#"
            [[arrs]]
            name = "movies"
            type = "radarr"
            url = "http://radarr:7878"
            api_key = ""
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn malformed_action_shape_fails_to_parse() {
        let toml = r#"
            [[rules]]
            pattern = "x"
            action = [{ REMUX = { success = "DELETE" } }]
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenemend.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.arrs[1].name, "shows");
    }
}
