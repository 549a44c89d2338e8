use crate::sweep::ListScope;

/// Resolves where a command operates, falling back to the namespace of the
/// current kubeconfig context.
pub struct ResourceResolver<'k> {
    kube_client: &'k kube::Client,
}

impl<'k> From<&'k kube::Client> for ResourceResolver<'k> {
    fn from(kube_client: &'k kube::Client) -> Self { Self { kube_client } }
}

impl ResourceResolver<'_> {
    /// `all_namespaces` wins over `namespace`; an empty `namespace` counts as
    /// unset.
    pub fn resolve_scope(&self, namespace: Option<String>, all_namespaces: bool) -> ListScope {
        if all_namespaces {
            return ListScope::AllNamespaces;
        }
        resolve_namespace(namespace, || self.kube_client.default_namespace().to_string())
    }
}

fn resolve_namespace<F>(namespace: Option<String>, default_namespace: F) -> ListScope
where
    F: FnOnce() -> String,
{
    ListScope::Namespace(namespace.filter(|s| !s.is_empty()).unwrap_or_else(default_namespace))
}
