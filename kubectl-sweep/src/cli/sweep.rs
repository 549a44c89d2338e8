//! Deletes pods left behind in a terminal phase.
//!
//! This is what `kubectl sweep` runs when no subcommand is given. Every flag
//! that has a counterpart in the configuration file overrides it.

use clap::{ArgAction, Args};

use crate::{
    cli::{error::Error, internal::ResourceResolver},
    config::Config,
    ext::PodPhase,
    sweep::{DryRunStrategy, KubePodApi, Options, OutputFormat, PhaseDeterminer, Printer},
};

#[derive(Args, Clone, Debug)]
pub struct SweepCommand {
    #[arg(
        short,
        long,
        help = "Kubernetes namespace to sweep. Defaults to the current Kubernetes context's \
                namespace."
    )]
    pub namespace: Option<String>,

    #[arg(short = 'A', long, help = "Sweep pods across all namespaces. Overrides --namespace.")]
    pub all_namespaces: bool,

    #[arg(
        short = 'l',
        long = "selector",
        help = "Label selector to filter pods on, e.g. -l key1=value1,key2=value2."
    )]
    pub selector: Option<String>,

    #[arg(
        long,
        help = "Field selector to filter pods on, e.g. --field-selector spec.nodeName=node-1."
    )]
    pub field_selector: Option<String>,

    #[arg(
        long,
        help = "Number of pods requested per list call. 0 fetches everything at once. \
                Defaults to 500."
    )]
    pub chunk_size: Option<u32>,

    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "client",
        help = "Report the pods that would be deleted without deleting them. \
                `--dry-run` alone means `--dry-run=client`."
    )]
    pub dry_run: Option<DryRunStrategy>,

    #[arg(
        long,
        help = "Seconds given to each pod to terminate gracefully. Uses the pod's own \
                setting when omitted."
    )]
    pub grace_period: Option<u32>,

    #[arg(
        long = "phase",
        value_enum,
        ignore_case = true,
        action = ArgAction::Append,
        help = "Pod phase eligible for deletion, may be repeated. Defaults to Failed."
    )]
    pub phases: Vec<PodPhase>,

    #[arg(short, long, value_enum, help = "Output format. One of: name, json, yaml.")]
    pub output: Option<OutputFormat>,
}

impl SweepCommand {
    /// Deletes every pod in scope whose phase is eligible, printing one record
    /// per pod to stdout.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if listing the pods fails, if any delete call fails,
    /// or if a record cannot be written.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let Self {
            namespace,
            all_namespaces,
            selector,
            field_selector,
            chunk_size,
            dry_run,
            grace_period,
            phases,
            output,
        } = self;

        let scope = ResourceResolver::from(&kube_client).resolve_scope(namespace, all_namespaces);
        let dry_run = dry_run.unwrap_or(config.dry_run);
        let determiner =
            PhaseDeterminer::new(if phases.is_empty() { config.phases } else { phases });

        tracing::debug!(
            "Sweeping pods in {} with phases {:?}",
            scope.describe(),
            determiner.phases().collect::<Vec<_>>()
        );

        let mut options = Options {
            scope,
            label_selector: selector,
            field_selector,
            chunk_size: chunk_size.unwrap_or(config.chunk_size),
            grace_period,
            dry_run,
            printer: Printer::new(output, dry_run),
            out: std::io::stdout(),
        };
        let swept = options.run(&KubePodApi::from(kube_client), &determiner).await?;

        if swept == 0 {
            tracing::info!("No pods to sweep");
        } else {
            tracing::info!("Swept {swept} pod(s)");
        }
        Ok(())
    }
}
