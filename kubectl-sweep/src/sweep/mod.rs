//! Deletes the pods a [`Determiner`] selects.
//!
//! A sweep lists every pod in scope, asks the determiner about each one and,
//! unless a dry-run strategy is set, deletes the selected pods one after
//! another. Every pod that was deleted (or would have been) is reported
//! through the [`Printer`] in listing order.

mod determiner;
mod dry_run;
pub mod error;
mod lister;
mod printer;

use std::{collections::HashSet, io::Write};

use kube::api::{DeleteParams, ListParams};
use snafu::ResultExt;

use self::{determiner::Determiner, lister::PodApi};
pub use self::{
    determiner::PhaseDeterminer,
    dry_run::DryRunStrategy,
    error::Error,
    lister::{KubePodApi, ListScope},
    printer::{OutputFormat, Printer},
};

/// Runtime configuration of one sweep.
pub struct Options<W> {
    /// Namespace to sweep, or every namespace.
    pub scope: ListScope,

    /// Label selector passed to every list request.
    pub label_selector: Option<String>,

    /// Field selector passed to every list request.
    pub field_selector: Option<String>,

    /// Pods requested per list call; `0` fetches the whole list at once.
    pub chunk_size: u32,

    /// Grace period sent with each delete call. `None` keeps the pod's own.
    pub grace_period: Option<u32>,

    /// Any strategy other than `None` suppresses the delete calls.
    pub dry_run: DryRunStrategy,

    pub printer: Printer,

    /// Sink receiving one record per swept pod.
    pub out: W,
}

impl<W> Options<W>
where
    W: Write,
{
    fn list_params(&self) -> ListParams {
        let mut params = ListParams::default();
        if let Some(labels) = self.label_selector.as_deref().filter(|s| !s.is_empty()) {
            params = params.labels(labels);
        }
        if let Some(fields) = self.field_selector.as_deref().filter(|s| !s.is_empty()) {
            params = params.fields(fields);
        }
        params
    }

    fn delete_params(&self) -> DeleteParams {
        DeleteParams { grace_period_seconds: self.grace_period, ..DeleteParams::default() }
    }

    /// Lists the pods in scope and deletes those `determiner` selects.
    ///
    /// Listing finishes before the first delete call, so a failed list request
    /// leaves every pod untouched. A failed delete does not stop the sweep:
    /// the remaining pods are still processed and the failures are returned
    /// together once the list is exhausted. Output errors abort immediately.
    ///
    /// Returns the number of pods deleted, or reported under dry-run.
    ///
    /// # Errors
    ///
    /// * [`Error::ListPods`] if any list request fails.
    /// * [`Error::DeletePod`] or [`Error::DeletePods`] if delete calls fail.
    /// * [`Error::WriteOutput`] and the serialization variants if a record
    ///   cannot be printed.
    // Runs on the caller's task; nothing here is spawned.
    #[allow(clippy::future_not_send)]
    pub async fn run<A, D>(&mut self, api: &A, determiner: &D) -> Result<usize, Error>
    where
        A: PodApi,
        D: Determiner,
    {
        let pods = lister::list_pods(api, &self.scope, &self.list_params(), self.chunk_size).await?;
        let delete_params = self.delete_params();

        let mut seen = HashSet::new();
        let mut swept = 0;
        let mut delete_errors = Vec::new();

        for (pod_ref, pod) in pods {
            if !seen.insert((pod_ref.namespace.clone(), pod_ref.name.clone())) {
                tracing::debug!("Pod {pod_ref} was listed more than once, skipping");
                continue;
            }
            if !determiner.should_delete(&pod_ref) {
                tracing::trace!("Keeping pod {pod_ref} in phase {}", pod_ref.phase);
                continue;
            }

            if self.dry_run.is_dry_run() {
                tracing::info!(
                    "Would delete pod {pod_ref} in phase {} (dry run: {})",
                    pod_ref.phase,
                    self.dry_run
                );
            } else {
                tracing::info!("Deleting pod {pod_ref} in phase {}", pod_ref.phase);
                let deleted = api
                    .delete(&pod_ref.namespace, &pod_ref.name, &delete_params)
                    .await
                    .with_context(|_| error::DeletePodSnafu {
                        namespace: pod_ref.namespace.clone(),
                        pod_name: pod_ref.name.clone(),
                    });
                if let Err(err) = deleted {
                    tracing::error!("{err}");
                    delete_errors.push(err);
                    continue;
                }
            }

            self.printer.print_obj(&pod_ref, &pod, &mut self.out)?;
            swept += 1;
        }

        self.out.flush().context(error::WriteOutputSnafu)?;

        match Error::from_delete_errors(delete_errors) {
            Some(err) => Err(err),
            None => Ok(swept),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use kube::api::DynamicObject;
    use serde_json::json;

    use super::{determiner::FixedDeterminer, lister::PodPage, *};
    use crate::ext::{PodPhase, PodRef};

    const TEST_NAMESPACE: &str = "test";

    fn pod_object(name: &str, phase: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "namespace": TEST_NAMESPACE },
            "status": { "phase": phase },
        }))
        .unwrap()
    }

    fn page(items: Vec<DynamicObject>, continue_token: Option<&str>) -> PodPage {
        PodPage { items, continue_token: continue_token.map(ToString::to_string) }
    }

    /// Serves pre-recorded list pages and records every delete call.
    #[derive(Default)]
    struct FakePodApi {
        pages: Vec<PodPage>,
        fail_list: bool,
        fail_deletes: Vec<String>,
        list_calls: RefCell<Vec<ListParams>>,
        deleted: RefCell<Vec<(String, String)>>,
        grace_periods: RefCell<Vec<Option<u32>>>,
    }

    impl FakePodApi {
        fn with_pods(pods: Vec<DynamicObject>) -> Self {
            Self { pages: vec![page(pods, None)], ..Self::default() }
        }

        fn deleted_names(&self) -> Vec<String> {
            self.deleted.borrow().iter().map(|(_, name)| name.clone()).collect()
        }
    }

    impl PodApi for FakePodApi {
        async fn list_page(
            &self,
            scope: &ListScope,
            params: &ListParams,
        ) -> Result<PodPage, kube::Error> {
            assert_eq!(scope, &ListScope::Namespace(TEST_NAMESPACE.to_string()));
            if self.fail_list {
                return Err(kube::Error::Service("connection refused".into()));
            }
            let index = match params.continue_token.as_deref() {
                None => 0,
                Some(token) => token.parse::<usize>().unwrap(),
            };
            self.list_calls.borrow_mut().push(params.clone());
            Ok(self.pages[index].clone())
        }

        async fn delete(
            &self,
            namespace: &str,
            pod_name: &str,
            params: &DeleteParams,
        ) -> Result<(), kube::Error> {
            self.grace_periods.borrow_mut().push(params.grace_period_seconds);
            if self.fail_deletes.iter().any(|name| name == pod_name) {
                return Err(kube::Error::Service(format!("cannot delete {pod_name}").into()));
            }
            self.deleted.borrow_mut().push((namespace.to_string(), pod_name.to_string()));
            Ok(())
        }
    }

    fn options(dry_run: DryRunStrategy) -> Options<Vec<u8>> {
        Options {
            scope: ListScope::Namespace(TEST_NAMESPACE.to_string()),
            label_selector: None,
            field_selector: None,
            chunk_size: 10,
            grace_period: None,
            dry_run,
            printer: Printer::new(None, dry_run),
            out: Vec::new(),
        }
    }

    fn output(options: &Options<Vec<u8>>) -> String {
        String::from_utf8(options.out.clone()).unwrap()
    }

    fn failed_foo_and_baz() -> Vec<DynamicObject> {
        vec![pod_object("foo", "Failed"), pod_object("baz", "Failed")]
    }

    fn foo_and_bar() -> Vec<DynamicObject> {
        vec![pod_object("foo", "Failed"), pod_object("bar", "Running")]
    }

    #[tokio::test]
    async fn test_delete_pod_that_should_be_deleted() {
        let api = FakePodApi::with_pods(foo_and_bar());
        let determiner = FixedDeterminer {
            pods: vec![PodRef::new(TEST_NAMESPACE, "foo", PodPhase::Failed)],
        };
        let mut options = options(DryRunStrategy::None);

        let swept = options.run(&api, &determiner).await.unwrap();

        assert_eq!(swept, 1);
        assert_eq!(output(&options), "pod/foo deleted\n");
        assert_eq!(*api.deleted.borrow(), vec![(TEST_NAMESPACE.to_string(), "foo".to_string())]);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_delete() {
        for dry_run in [DryRunStrategy::Client, DryRunStrategy::Server] {
            let api = FakePodApi::with_pods(foo_and_bar());
            let mut options = options(dry_run);

            let swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

            assert_eq!(swept, 1);
            assert_eq!(output(&options), "pod/foo deleted (dry run)\n");
            assert!(api.deleted.borrow().is_empty());
        }
    }

    #[tokio::test]
    async fn test_output_follows_listing_order() {
        let api = FakePodApi::with_pods(vec![
            pod_object("c", "Failed"),
            pod_object("a", "Running"),
            pod_object("b", "Failed"),
            pod_object("d", "Failed"),
        ]);
        let mut options = options(DryRunStrategy::None);

        let _swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(output(&options), "pod/c deleted\npod/b deleted\npod/d deleted\n");
        assert_eq!(api.deleted_names(), vec!["c", "b", "d"]);
    }

    #[tokio::test]
    async fn test_list_failure_deletes_nothing() {
        let api = FakePodApi { fail_list: true, ..FakePodApi::with_pods(foo_and_bar()) };
        let mut options = options(DryRunStrategy::None);

        let err = options.run(&api, &PhaseDeterminer::default()).await.unwrap_err();

        assert!(matches!(err, Error::ListPods { .. }));
        assert!(output(&options).is_empty());
        assert!(api.deleted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_follows_continue_tokens() {
        let api = FakePodApi {
            pages: vec![
                page(vec![pod_object("foo", "Failed")], Some("1")),
                page(vec![pod_object("bar", "Running")], Some("2")),
                page(vec![pod_object("baz", "Failed")], None),
            ],
            ..FakePodApi::default()
        };
        let mut options = options(DryRunStrategy::None);

        let _swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(output(&options), "pod/foo deleted\npod/baz deleted\n");
        let list_calls = api.list_calls.borrow();
        assert_eq!(list_calls.len(), 3);
        assert!(list_calls.iter().all(|params| params.limit == Some(10)));
        assert_eq!(list_calls[2].continue_token.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_deletes_each_pod_at_most_once() {
        let api = FakePodApi {
            pages: vec![
                page(vec![pod_object("foo", "Failed")], Some("1")),
                page(vec![pod_object("foo", "Failed")], None),
            ],
            ..FakePodApi::default()
        };
        let mut options = options(DryRunStrategy::None);

        let swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(swept, 1);
        assert_eq!(api.deleted_names(), vec!["foo"]);
        assert_eq!(output(&options), "pod/foo deleted\n");
    }

    #[tokio::test]
    async fn test_skips_objects_that_are_not_pods() {
        let malformed: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "broken", "namespace": TEST_NAMESPACE },
            "status": { "phase": 42 },
        }))
        .unwrap();
        let api = FakePodApi::with_pods(vec![malformed, pod_object("foo", "Failed")]);
        let mut options = options(DryRunStrategy::None);

        let _swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(output(&options), "pod/foo deleted\n");
        assert_eq!(api.deleted_names(), vec!["foo"]);
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_stop_the_sweep() {
        let api = FakePodApi {
            fail_deletes: vec!["foo".to_string()],
            ..FakePodApi::with_pods(failed_foo_and_baz())
        };
        let mut options = options(DryRunStrategy::None);

        let err = options.run(&api, &PhaseDeterminer::default()).await.unwrap_err();

        assert!(matches!(err, Error::DeletePod { ref pod_name, .. } if pod_name == "foo"));
        assert_eq!(output(&options), "pod/baz deleted\n");
        assert_eq!(api.deleted_names(), vec!["baz"]);
    }

    #[tokio::test]
    async fn test_multiple_failed_deletes_are_aggregated() {
        let api = FakePodApi {
            fail_deletes: vec!["foo".to_string(), "baz".to_string()],
            ..FakePodApi::with_pods(failed_foo_and_baz())
        };
        let mut options = options(DryRunStrategy::None);

        let err = options.run(&api, &PhaseDeterminer::default()).await.unwrap_err();

        let Error::DeletePods { errors } = &err else {
            panic!("expected aggregated error, got {err}");
        };
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().starts_with("Failed to delete 2 pods:"));
        assert!(output(&options).is_empty());
    }

    #[tokio::test]
    async fn test_zero_chunk_size_lists_in_one_request() {
        let api = FakePodApi {
            pages: vec![
                page(vec![pod_object("foo", "Failed")], Some("1")),
                page(vec![pod_object("baz", "Failed")], None),
            ],
            ..FakePodApi::default()
        };
        let mut options = Options { chunk_size: 0, ..options(DryRunStrategy::None) };

        let swept = options.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(swept, 1);
        assert_eq!(output(&options), "pod/foo deleted\n");
        let list_calls = api.list_calls.borrow();
        assert_eq!(list_calls.len(), 1);
        assert_eq!(list_calls[0].limit, None);
        assert_eq!(list_calls[0].continue_token, None);
    }

    #[tokio::test]
    async fn test_grace_period_reaches_delete_calls() {
        let api = FakePodApi::with_pods(failed_foo_and_baz());
        let mut with_grace_period =
            Options { grace_period: Some(30), ..options(DryRunStrategy::None) };

        let _swept = with_grace_period.run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(*api.grace_periods.borrow(), vec![Some(30), Some(30)]);

        let api = FakePodApi::with_pods(failed_foo_and_baz());
        let _swept =
            options(DryRunStrategy::None).run(&api, &PhaseDeterminer::default()).await.unwrap();

        assert_eq!(*api.grace_periods.borrow(), vec![None, None]);
    }

    #[test]
    fn test_list_and_delete_params() {
        let options = Options {
            label_selector: Some("app=batch".to_string()),
            field_selector: Some(String::new()),
            grace_period: Some(0),
            ..options(DryRunStrategy::None)
        };

        let list_params = options.list_params();
        assert_eq!(list_params.label_selector.as_deref(), Some("app=batch"));
        assert_eq!(list_params.field_selector, None);
        assert_eq!(options.delete_params().grace_period_seconds, Some(0));
    }
}
