#![allow(dead_code)]

use std::sync::Arc;

use hashcat_launcher::bridge::NotificationBridge;
use hashcat_launcher::config::TaskOptions;
use hashcat_launcher::engine::{DefaultHooks, TaskHooks, TaskManager};
use hashcat_launcher::exec::ExecutorBackend;
use hashcat_launcher::registry::{Algorithm, ResourceRegistry};

pub use hashcat_launcher_test_utils::builders::{sample_algorithms, ResourceTree, TaskRequestBuilder};
pub use hashcat_launcher_test_utils::fake_executor::{FakeExecutor, FakeScript};
pub use hashcat_launcher_test_utils::recorder::{Recorded, RecordingObserver};
pub use hashcat_launcher_test_utils::{init_tracing, wait_until, with_timeout};

/// A task manager over a temporary resource tree, with a recording
/// observer attached.
pub struct Harness {
    pub tree: ResourceTree,
    pub registry: Arc<ResourceRegistry>,
    pub bridge: NotificationBridge,
    pub observer: RecordingObserver,
    pub manager: TaskManager,
}

impl Harness {
    /// Tree with `rockyou.txt` and `hashes.txt`, the sample catalog and the
    /// given backend.
    pub fn new(executor: Arc<dyn ExecutorBackend>) -> Self {
        Self::with(executor, sample_algorithms(), TaskOptions::default())
    }

    pub fn with(
        executor: Arc<dyn ExecutorBackend>,
        algorithms: Vec<Algorithm>,
        options: TaskOptions,
    ) -> Self {
        init_tracing();
        let tree = ResourceTree::new();
        tree.add_dictionary("rockyou.txt", "password\n123456\n");
        tree.add_hashes("hashes.txt", "5f4dcc3b5aa765d61d8327deb882cf99\n");
        let registry = tree.scanned_registry(algorithms);

        let hooks: Arc<dyn TaskHooks> = Arc::new(DefaultHooks::new(
            &tree.paths().exported_dir,
            options.export_recovered,
        ));
        Self::assemble(tree, registry, executor, hooks, options)
    }

    pub fn assemble(
        tree: ResourceTree,
        registry: Arc<ResourceRegistry>,
        executor: Arc<dyn ExecutorBackend>,
        hooks: Arc<dyn TaskHooks>,
        options: TaskOptions,
    ) -> Self {
        let bridge = NotificationBridge::new();
        let observer = RecordingObserver::new();
        bridge.register(Arc::new(observer.clone()));

        let manager = TaskManager::new(
            Arc::clone(&registry),
            executor,
            hooks,
            bridge.clone(),
            options,
        );
        Self {
            tree,
            registry,
            bridge,
            observer,
            manager,
        }
    }

    /// Deliver everything emitted so far to the observer.
    pub async fn flush(&self) {
        self.bridge.flush().await;
    }
}
