use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to list pods in {scope}, error: {source}"))]
    ListPods {
        scope: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to delete pod {pod_name} in namespace {namespace}, error: {source}"))]
    DeletePod {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to delete {} pods:\n{}", errors.len(), render_errors(errors)))]
    DeletePods { errors: Vec<Error> },

    #[snafu(display("Failed to write output, error: {source}"))]
    WriteOutput { source: std::io::Error },

    #[snafu(display("Failed to serialize pod {pod_name} as JSON, error: {source}"))]
    SerializePodJson { pod_name: String, source: serde_json::Error },

    #[snafu(display("Failed to serialize pod {pod_name} as YAML, error: {source}"))]
    SerializePodYaml { pod_name: String, source: serde_yaml::Error },
}

impl Error {
    /// Folds the errors of individual delete calls into one terminal error.
    pub(crate) fn from_delete_errors(mut errors: Vec<Self>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::DeletePods { errors }),
        }
    }
}

fn render_errors(errors: &[Error]) -> String {
    errors.iter().map(|err| format!("  - {err}")).collect::<Vec<_>>().join("\n")
}
