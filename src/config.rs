use crate::metrics::{collector, users};
use config::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ARG_PRINT_CONFIG: &str = "--print-config";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Log {
    pub enable_stdout: bool,
    pub enable_log_file: bool,
    pub log_file_directory: Option<String>,
    pub level: String,
    pub directives: Vec<String>,
    pub max_log_files: usize,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            enable_log_file: false,
            log_file_directory: Some("/tmp/var/log/business-metrics/".to_owned()),
            level: "INFO".to_owned(),
            directives: vec![],
            max_log_files: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
    pub address: String,
    pub port: u16,
    pub timeout: u64,
    pub metrics_path: String,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 9108,
            timeout: Duration::from_secs(10).as_millis() as u64,
            metrics_path: "/metrics".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "Log::default")]
    pub log: Log,

    #[serde(default = "Http::default")]
    pub http: Http,

    #[serde(default = "collector::Config::default")]
    pub business_metrics: collector::Config,

    #[serde(default = "users::Config::default")]
    pub users: users::Config,
}

impl Configuration {
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let base_path = base_path.as_ref();

        let cfg = Config::builder()
            .add_source(
                config::File::from(base_path.join("config.toml"))
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::File::from(base_path.join("config.json"))
                    .format(config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("CFG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        cfg.try_deserialize()
    }
}

/// The first positional argument, or the working directory.
pub fn get_config_base_path(
    args: impl IntoIterator<Item = String>,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let base_path = args
        .into_iter()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .unwrap_or_else(|| "./".to_owned());

    if !Path::new(&base_path).is_dir() {
        return Err(format!("The configuration path [{}] is not a directory", base_path).into());
    }

    Ok(base_path)
}

pub fn should_print_config_and_exit(args: impl IntoIterator<Item = String>) -> bool {
    args.into_iter().skip(1).any(|arg| arg == ARG_PRINT_CONFIG)
}

pub fn print_config(
    configuration: &Configuration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(configuration)?);
    Ok(())
}
