use crate::metrics::registry::BusinessMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enabled: bool,
    pub name: String,
    pub documentation: String,
    pub passwd_file: PathBuf,
    /// Accounts below this uid are not counted. Counts every account if unset.
    pub min_uid: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "user_count_metric".to_owned(),
            documentation: "Total number of user accounts".to_owned(),
            passwd_file: PathBuf::from("/etc/passwd"),
            min_uid: None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserAccount {
    pub name: String,
    pub uid: u32,
}

/// A user-account store.
pub trait DataSource: Send + Sync + 'static {
    fn accounts(&self) -> anyhow::Result<Vec<UserAccount>>;
}

pub struct UserCount<T> {
    config: Config,
    data_source: Arc<T>,
}

impl<T> UserCount<T>
where
    T: DataSource,
{
    pub fn new(config: Config, data_source: T) -> Self {
        Self {
            config,
            data_source: Arc::new(data_source),
        }
    }

    pub fn register(self, registry: &mut BusinessMetrics) {
        if !self.config.enabled {
            tracing::info!("The user count business metric is disabled");
            return;
        }

        let min_uid = self.config.min_uid;
        let data_source = self.data_source;

        registry.register(
            &self.config.name,
            &self.config.documentation,
            move || count_users(data_source.as_ref(), min_uid),
        );
    }
}

fn count_users<T: DataSource>(data_source: &T, min_uid: Option<u32>) -> anyhow::Result<usize> {
    let accounts = data_source.accounts()?;
    let count = match min_uid {
        None => accounts.len(),
        Some(min_uid) => accounts.iter().filter(|a| a.uid >= min_uid).count(),
    };

    Ok(count)
}
