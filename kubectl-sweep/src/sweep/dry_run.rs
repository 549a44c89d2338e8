use std::fmt;

use serde::{Deserialize, Serialize};

/// Controls whether delete calls are sent to the API server.
///
/// Both `Client` and `Server` suppress the delete request; the two are kept
/// apart so the flag accepts the same values as `kubectl delete --dry-run`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum DryRunStrategy {
    #[default]
    None,
    Client,
    Server,
}

impl DryRunStrategy {
    #[inline]
    #[must_use]
    pub const fn is_dry_run(self) -> bool { !matches!(self, Self::None) }
}

impl fmt::Display for DryRunStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}
