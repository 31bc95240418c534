//! Host entry point
//!
//! Wires the default components (JSON config, JSON file store, HTTP probe)
//! around the host's view and shell, and spawns the orchestrator loop.

use crate::config;
use crate::error::SetupError;
use crate::orchestrator::{Orchestrator, OrchestratorHandle};
use crate::platform;
use crate::probe::HttpProber;
use crate::store::JsonFileStore;
use crate::ui::AppShell;
use crate::view::ViewHost;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Start the shell with config and storage in the platform config directory.
pub fn spawn(
    views: Box<dyn ViewHost>,
    shell: Box<dyn AppShell>,
) -> Result<(OrchestratorHandle, JoinHandle<()>), SetupError> {
    let config = config::load_config()?;
    let store = JsonFileStore::open(platform::store_path())?;
    spawn_with(config, store, views, shell)
}

/// Start the shell with config and storage at explicit paths (sandboxed hosts).
pub fn spawn_in(
    config_path: &Path,
    store_path: &Path,
    views: Box<dyn ViewHost>,
    shell: Box<dyn AppShell>,
) -> Result<(OrchestratorHandle, JoinHandle<()>), SetupError> {
    let config = config::load_config_from(config_path)?;
    let store = JsonFileStore::open(store_path)?;
    spawn_with(config, store, views, shell)
}

fn spawn_with(
    config: config::AppConfig,
    store: JsonFileStore,
    views: Box<dyn ViewHost>,
    shell: Box<dyn AppShell>,
) -> Result<(OrchestratorHandle, JoinHandle<()>), SetupError> {
    let prober = HttpProber::new(config.probe_timeout())?;
    tracing::info!("Starting shell, store at {}", store.path().display());

    let (orchestrator, rx) =
        Orchestrator::new(config, Box::new(store), Arc::new(prober), views, shell);
    let handle = orchestrator.handle();
    let task = tokio::spawn(orchestrator.run(rx));
    Ok((handle, task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpenError;
    use crate::store::{KeyValueStore, SERVER_ADDRESS_KEY};
    use crate::ui::UiState;
    use crate::view::{BrowserView, ViewEventSink};
    use std::sync::Mutex;

    struct NoViews;

    impl ViewHost for NoViews {
        fn open(
            &mut self,
            _url: &str,
            _target: &str,
            _options: &str,
            _events: ViewEventSink,
        ) -> Result<Box<dyn BrowserView>, OpenError> {
            Err(OpenError("no browser".into()))
        }
    }

    struct RecordingShell(Arc<Mutex<Vec<UiState>>>);

    impl AppShell for RecordingShell {
        fn render(&mut self, ui: &UiState) {
            self.0.lock().unwrap().push(ui.clone());
        }

        fn confirm_exit(&mut self, _prompt: &str) -> bool {
            false
        }

        fn exit_app(&mut self) {}
    }

    #[tokio::test]
    async fn test_spawn_in_prefills_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store.json");
        let mut store = JsonFileStore::open(&store_path).unwrap();
        store
            .set(SERVER_ADDRESS_KEY, "http://192.168.1.10:8123")
            .unwrap();

        let renders = Arc::new(Mutex::new(Vec::new()));
        let (handle, task) = spawn_in(
            &dir.path().join("config.json"),
            &store_path,
            Box::new(NoViews),
            Box::new(RecordingShell(Arc::clone(&renders))),
        )
        .unwrap();

        assert!(handle.shutdown());
        task.await.unwrap();

        let renders = renders.lock().unwrap();
        let first = renders.first().expect("initial render");
        assert_eq!(first.form.address, "http://192.168.1.10:8123");
    }

    #[tokio::test]
    async fn test_spawn_in_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "not json").unwrap();

        let result = spawn_in(
            &config_path,
            &dir.path().join("store.json"),
            Box::new(NoViews),
            Box::new(RecordingShell(Arc::new(Mutex::new(Vec::new())))),
        );
        assert!(matches!(result, Err(SetupError::Config(_))));
    }
}
