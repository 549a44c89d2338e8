mod error;
mod log;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sweep_base::consts::k8s::DEFAULT_CHUNK_SIZE;

pub use self::{error::Error, log::LogConfig};
use crate::{ext::PodPhase, sweep::DryRunStrategy};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of pods requested per list call, `0` disables chunking.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Pod phases that make a pod eligible for deletion.
    #[serde(default = "default_phases")]
    pub phases: Vec<PodPhase>,

    #[serde(default)]
    pub dry_run: DryRunStrategy,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            phases: default_phases(),
            dry_run: DryRunStrategy::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Returns the first existing config file among the default and fallback
    /// locations, or `None` if there is none.
    pub fn search_config_file_path() -> Option<PathBuf> {
        std::iter::once(Self::default_path())
            .chain(sweep_base::fallback_project_config_directories().into_iter().map(|mut path| {
                path.push(sweep_base::CLI_CONFIG_NAME);
                path
            }))
            .find(|path| path.try_exists().unwrap_or(false))
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [sweep_base::PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(sweep_base::CLI_CONFIG_NAME)]
            .into_iter()
            .collect()
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).context(error::SerializeConfigSnafu)
    }
}

const fn default_chunk_size() -> u32 { DEFAULT_CHUNK_SIZE }

fn default_phases() -> Vec<PodPhase> { vec![PodPhase::Failed] }
