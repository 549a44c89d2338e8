pub mod k8s {
    /// Lowercase kind used when printing `<resource>/<name>`.
    pub const POD_RESOURCE: &str = "pod";

    /// Page size used when listing pods, matching kubectl's `--chunk-size`.
    pub const DEFAULT_CHUNK_SIZE: u32 = 500;
}

pub mod output {
    pub const OPERATION_DELETED: &str = "deleted";

    pub const DRY_RUN_SUFFIX: &str = "(dry run)";

    pub const YAML_DOCUMENT_SEPARATOR: &str = "---";
}
