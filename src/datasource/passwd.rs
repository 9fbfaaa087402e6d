use crate::datasource::Reader;
use crate::metrics::users::{DataSource, UserAccount};
use anyhow::Context;
use std::path::PathBuf;

pub const PATH_PASSWD: &str = "/etc/passwd";

/// User accounts listed in a passwd(5) formatted file.
pub struct Passwd<R> {
    reader: R,
    path: PathBuf,
}

impl<R> Passwd<R>
where
    R: Reader,
{
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
        }
    }

    fn parse_line(&self, line: &str) -> Option<UserAccount> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        // name:password:uid:gid:gecos:home:shell
        let mut fields = line.split(':');
        let name = fields.next().filter(|name| !name.is_empty());
        let uid = fields.nth(1).and_then(|uid| uid.trim().parse::<u32>().ok());

        match (name, uid) {
            (Some(name), Some(uid)) => Some(UserAccount {
                name: name.to_owned(),
                uid,
            }),

            _ => {
                tracing::info!("Skipping invalid passwd line: {}", line);
                None
            }
        }
    }
}

impl<R> DataSource for Passwd<R>
where
    R: Reader + 'static,
{
    #[tracing::instrument(level = "debug", skip_all)]
    fn accounts(&self) -> anyhow::Result<Vec<UserAccount>> {
        let content = self
            .reader
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read user accounts from {:?}", self.path))?;

        Ok(content
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect())
    }
}
