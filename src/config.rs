use crate::cli::CliArgs;
use crate::model::Service;
use anyhow::{Context, Result, bail};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Deserialize, Default)]
struct NimbusConfigFile {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    catalog: Option<PathBuf>,
    #[serde(default, alias = "service")]
    default_service: Option<String>,
    #[serde(default, alias = "timeout")]
    timeout_secs: Option<u64>,
    #[serde(default, alias = "latency")]
    latency_ms: Option<u64>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    accents: BTreeMap<String, String>,
}

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Option<String>,
    pub region: String,
    pub profile: String,
    pub catalog: Option<PathBuf>,
    pub service: Option<Service>,
    pub timeout: Duration,
    pub latency: Duration,
    pub page_size: usize,
    pub accents: HashMap<Service, Color>,
}

pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let path = args.config.clone().or_else(discover_config_path);
    let file = match &path {
        Some(path) => read_config(path)?,
        None => NimbusConfigFile::default(),
    };
    resolve(args, file, path.map(|path| path.display().to_string()))
}

fn read_config(path: &Path) -> Result<NimbusConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse_config(raw: &str) -> Result<NimbusConfigFile> {
    if raw.trim().is_empty() {
        return Ok(NimbusConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn resolve(args: &CliArgs, file: NimbusConfigFile, source: Option<String>) -> Result<Settings> {
    let service = match args.service.as_deref().or(file.default_service.as_deref()) {
        Some(token) => match Service::from_token(token) {
            Some(service) => Some(service),
            None => bail!("unknown service '{token}'"),
        },
        None => None,
    };

    let mut accents = HashMap::new();
    for (token, value) in &file.accents {
        let Some(service) = Service::from_token(token) else {
            warn!(service = token.as_str(), "ignoring accent for unknown service");
            continue;
        };
        match Color::from_str(value) {
            Ok(color) => {
                accents.insert(service, color);
            }
            Err(_) => warn!(service = token.as_str(), value = value.as_str(), "ignoring invalid accent colour"),
        }
    }

    let timeout_secs = args
        .timeout_secs
        .or(file.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .max(1);
    let latency_ms = args.latency_ms.or(file.latency_ms).unwrap_or(0);
    let page_size = args
        .page_size
        .or(file.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1);

    Ok(Settings {
        source,
        region: args
            .region
            .clone()
            .or(file.region)
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        profile: args
            .profile
            .clone()
            .or(file.profile)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
        catalog: args.catalog.clone().or(file.catalog),
        service,
        timeout: Duration::from_secs(timeout_secs),
        latency: Duration::from_millis(latency_ms),
        page_size,
        accents,
    })
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("NIMBUS_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("nimbus.yaml"),
        PathBuf::from("nimbus.yml"),
        PathBuf::from(".nimbus.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/nimbus/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PAGE_SIZE, parse_config, resolve};
    use crate::cli::CliArgs;
    use crate::model::Service;
    use ratatui::style::Color;
    use std::path::PathBuf;
    use std::time::Duration;

    const FILE: &str = "
region: eu-west-1
profile: staging
catalog: /srv/nimbus/catalog.yaml
default_service: cfn
timeout_secs: 10
latency_ms: 250
accents:
  lambda: '#ff8800'
  ec2: '#000000'
  logs: not-a-colour
";

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = resolve(&CliArgs::default(), Default::default(), None).expect("settings");
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.profile, "default");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.latency, Duration::ZERO);
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.service, None);
        assert!(settings.catalog.is_none());
    }

    #[test]
    fn file_values_fill_in_for_missing_flags() {
        let file = parse_config(FILE).expect("config parses");
        let settings = resolve(&CliArgs::default(), file, Some("nimbus.yaml".to_string()))
            .expect("settings");
        assert_eq!(settings.source.as_deref(), Some("nimbus.yaml"));
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.profile, "staging");
        assert_eq!(settings.service, Some(Service::Stacks));
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.latency, Duration::from_millis(250));
        assert_eq!(
            settings.catalog,
            Some(PathBuf::from("/srv/nimbus/catalog.yaml"))
        );
        assert_eq!(
            settings.accents.get(&Service::Lambda),
            Some(&Color::Rgb(0xff, 0x88, 0x00))
        );
        assert_eq!(settings.accents.len(), 1);
    }

    #[test]
    fn flags_win_over_file_values() {
        let file = parse_config(FILE).expect("config parses");
        let args = CliArgs {
            region: Some("ap-south-1".to_string()),
            service: Some("ddb".to_string()),
            timeout_secs: Some(0),
            page_size: Some(20),
            ..CliArgs::default()
        };
        let settings = resolve(&args, file, None).expect("settings");
        assert_eq!(settings.region, "ap-south-1");
        assert_eq!(settings.profile, "staging");
        assert_eq!(settings.service, Some(Service::Tables));
        assert_eq!(settings.timeout, Duration::from_secs(1));
        assert_eq!(settings.page_size, 20);
    }

    #[test]
    fn unknown_service_is_rejected() {
        let args = CliArgs {
            service: Some("ec2".to_string()),
            ..CliArgs::default()
        };
        let error = resolve(&args, Default::default(), None).expect_err("unknown service");
        assert!(error.to_string().contains("ec2"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = parse_config("  \n").expect("empty config");
        assert!(file.region.is_none());
        assert!(file.accents.is_empty());
        assert!(parse_config("region: [").is_err());
    }
}
