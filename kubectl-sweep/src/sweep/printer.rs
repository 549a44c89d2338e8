//! Formats the outcome of each sweep the way `kubectl delete` reports it.

use std::io::Write;

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sweep_base::consts::{
    k8s::POD_RESOURCE,
    output::{DRY_RUN_SUFFIX, OPERATION_DELETED, YAML_DOCUMENT_SEPARATOR},
};

use crate::{
    ext::PodRef,
    sweep::{
        DryRunStrategy,
        error::{self, Error},
    },
};

/// Values accepted by `-o/--output`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    Name,
    Json,
    Yaml,
}

/// Writes one record per swept pod.
///
/// Without an explicit output format each record is `pod/<name> <operation>`,
/// where the operation carries a `(dry run)` suffix when no delete call was
/// issued.
#[derive(Clone, Debug)]
pub struct Printer {
    format: Option<OutputFormat>,
    operation: String,
    printed: usize,
}

impl Printer {
    pub fn new(format: Option<OutputFormat>, dry_run: DryRunStrategy) -> Self {
        let operation = if dry_run.is_dry_run() {
            format!("{OPERATION_DELETED} {DRY_RUN_SUFFIX}")
        } else {
            OPERATION_DELETED.to_string()
        };
        Self { format, operation, printed: 0 }
    }

    pub fn print_obj<W>(&mut self, pod_ref: &PodRef, pod: &Pod, out: &mut W) -> Result<(), Error>
    where
        W: Write,
    {
        let name = &pod_ref.name;
        match self.format {
            None => writeln!(out, "{POD_RESOURCE}/{name} {}", self.operation)
                .context(error::WriteOutputSnafu)?,
            Some(OutputFormat::Name) => {
                writeln!(out, "{POD_RESOURCE}/{name}").context(error::WriteOutputSnafu)?;
            }
            Some(OutputFormat::Json) => {
                serde_json::to_writer_pretty(&mut *out, pod)
                    .with_context(|_| error::SerializePodJsonSnafu { pod_name: name.clone() })?;
                writeln!(out).context(error::WriteOutputSnafu)?;
            }
            Some(OutputFormat::Yaml) => {
                if self.printed > 0 {
                    writeln!(out, "{YAML_DOCUMENT_SEPARATOR}").context(error::WriteOutputSnafu)?;
                }
                serde_yaml::to_writer(&mut *out, pod)
                    .with_context(|_| error::SerializePodYamlSnafu { pod_name: name.clone() })?;
            }
        }
        self.printed += 1;
        Ok(())
    }
}
