use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{error, info, warn};

use crate::{
    api::{ApiClient, ApiError, BackendConfig},
    domain::{
        DownloadOutcome, DownloadRequest, FailureReason, HostWindow, ResolvedDestination,
        SaveDialogOptions, ARCHIVE_EXTENSION,
    },
    utils::{suggested_file_name, write_atomically},
};

/// State the bridge needs besides the HTTP client: the backend it talks
/// to, and the window that owns the save dialog.
///
/// The window is write-once. It is normally bound after the native window
/// has been built, since the window in turn needs the bridge for its IPC
/// handler.
pub struct BridgeContext {
    backend: BackendConfig,
    window: OnceLock<Arc<dyn HostWindow>>,
}

impl BridgeContext {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            backend,
            window: OnceLock::new(),
        }
    }

    /// Context for a window that already exists.
    pub fn with_window(backend: BackendConfig, window: Arc<dyn HostWindow>) -> Self {
        let context = Self::new(backend);
        context.bind_window(window);
        context
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// Panics if a window was already bound.
    pub fn bind_window(&self, window: Arc<dyn HostWindow>) {
        if self.window.set(window).is_err() {
            panic!("host window bound twice: the download bridge window is write-once");
        }
    }

    /// Panics if no window has been bound yet.
    pub fn window(&self) -> &Arc<dyn HostWindow> {
        self.window.get().unwrap_or_else(|| {
            panic!("download bridge invoked before its host window was bound")
        })
    }
}

/// Host-side half of the `download_file` operation exposed to script.
pub struct DownloadBridge {
    context: BridgeContext,
    api_client: ApiClient,
    download_dir: Option<PathBuf>,
}

impl DownloadBridge {
    pub fn new(context: BridgeContext) -> Self {
        let api_client = ApiClient::new(context.backend().clone());
        Self {
            context,
            api_client,
            download_dir: dirs::download_dir(),
        }
    }

    /// Open the save dialog in `dir` instead of the user's downloads folder.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn context(&self) -> &BridgeContext {
        &self.context
    }

    /// Script-facing entry point: the saved path, or `None` on cancel or
    /// any failure.
    pub async fn download_file(&self, document_id: &str, filename: &str) -> Option<String> {
        self.download_outcome(document_id, filename).await.path
    }

    /// Like [`download_file`](Self::download_file) but keeps the failure reason.
    pub async fn download_outcome(&self, document_id: &str, filename: &str) -> DownloadOutcome {
        // An unbound bridge is a wiring bug whatever the arguments are.
        self.context.window();

        match DownloadRequest::new(document_id, filename) {
            Ok(request) => self.download(request).await,
            Err(e) => {
                warn!(filename, "Rejected download request: {}", e);
                DownloadOutcome::failed(FailureReason::InvalidRequest)
            }
        }
    }

    /// Fetch, ask for a destination, write. Never returns an error: every
    /// failure is logged and folded into the outcome.
    pub async fn download(&self, request: DownloadRequest) -> DownloadOutcome {
        let window = self.context.window();
        let document_id = request.document_id.as_str();
        let url = self
            .api_client
            .download_url(document_id)
            .map(|u| u.to_string())
            .unwrap_or_default();

        let bytes = match self.api_client.fetch_document(document_id).await {
            Ok(bytes) => bytes,
            Err(ApiError::UnexpectedStatus { status, url }) => {
                warn!(document_id, %url, status, "Backend could not produce document");
                return DownloadOutcome::failed(FailureReason::BackendStatus);
            }
            Err(e) => {
                error!(document_id, %url, error = %e, "Document fetch failed");
                return DownloadOutcome::failed(FailureReason::Fetch);
            }
        };

        let file_name =
            suggested_file_name(&request.suggested_filename, document_id, ARCHIVE_EXTENSION);
        let options = SaveDialogOptions::archive(file_name, self.download_dir.clone());

        let selection = match window.save_dialog(options).await {
            Ok(selection) => selection,
            Err(e) => {
                error!(document_id, %url, bytes = bytes.len(), error = %e, "Save dialog failed");
                return DownloadOutcome::failed(FailureReason::Dialog);
            }
        };

        let path = match selection.resolve() {
            ResolvedDestination::Chosen(path) => path,
            ResolvedDestination::Cancelled => {
                info!(document_id, "Download cancelled");
                return DownloadOutcome::failed(FailureReason::Cancelled);
            }
        };

        if let Err(e) = write_atomically(&path, &bytes).await {
            error!(
                document_id,
                %url,
                bytes = bytes.len(),
                path = %path.display(),
                error = %e,
                "Failed to write document"
            );
            return DownloadOutcome::failed(FailureReason::Write);
        }

        info!(document_id, bytes = bytes.len(), path = %path.display(), "Document saved");
        DownloadOutcome::saved(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DialogSelection, HostError};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use url::Url;

    struct FakeWindow {
        answer: Result<DialogSelection, HostError>,
        requests: Mutex<Vec<SaveDialogOptions>>,
    }

    impl FakeWindow {
        fn answering(answer: DialogSelection) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: HostError) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(error),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HostWindow for FakeWindow {
        async fn save_dialog(
            &self,
            options: SaveDialogOptions,
        ) -> Result<DialogSelection, HostError> {
            self.requests.lock().unwrap().push(options);
            self.answer.clone()
        }
    }

    fn bridge_for(server: &mockito::ServerGuard, window: Arc<FakeWindow>) -> DownloadBridge {
        let backend = BackendConfig::new(Url::parse(&server.url()).unwrap());
        DownloadBridge::new(BridgeContext::with_window(backend, window))
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_download_saves_to_chosen_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.zip");
        let payload: Vec<u8> = (0..1024).map(|i| (i % 251) as u8).collect();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/download/doc-42")
            .with_status(200)
            .with_body(payload.clone())
            .create_async()
            .await;

        let window = FakeWindow::answering(DialogSelection::Single(target.clone()));
        let bridge = bridge_for(&server, window.clone());

        let result = bridge.download_file("doc-42", "report").await;

        assert_eq!(result, Some(target.to_string_lossy().into_owned()));
        assert_eq!(std::fs::read(&target).unwrap(), payload);
        assert_eq!(entries(dir.path()), 1);
        mock.assert_async().await;

        let requests = window.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].file_name, "report.zip");
        assert_eq!(requests[0].filters[0].extensions, vec!["zip".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_404_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.zip");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/missing")
            .with_status(404)
            .create_async()
            .await;

        let window = FakeWindow::answering(DialogSelection::Single(target.clone()));
        let bridge = bridge_for(&server, window.clone());

        let outcome = bridge
            .download(DownloadRequest::new("missing", "report").unwrap())
            .await;

        assert_eq!(outcome, DownloadOutcome::failed(FailureReason::BackendStatus));
        assert_eq!(window.calls(), 0);
        assert!(!target.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_cancelled_dialog_is_absence() {
        let dir = tempfile::tempdir().unwrap();

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/doc-42")
            .with_status(200)
            .with_body("zipdata")
            .create_async()
            .await;

        for answer in [DialogSelection::Multiple(vec![]), DialogSelection::None] {
            let window = FakeWindow::answering(answer);
            let bridge = bridge_for(&server, window.clone()).with_download_dir(dir.path());
            let outcome = bridge
                .download(DownloadRequest::new("doc-42", "report.zip").unwrap())
                .await;

            assert_eq!(outcome, DownloadOutcome::failed(FailureReason::Cancelled));

            let requests = window.requests.lock().unwrap();
            assert_eq!(requests[0].directory.as_deref(), Some(dir.path()));
            assert_eq!(requests[0].file_name, "report.zip");
        }
        assert!(!dir.path().join("report.zip").exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_multiple_selection_uses_first_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.zip");
        let second = dir.path().join("second.zip");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/doc-7")
            .with_status(200)
            .with_body("abc")
            .create_async()
            .await;

        let window = FakeWindow::answering(DialogSelection::Multiple(vec![
            first.clone(),
            second.clone(),
        ]));
        let bridge = bridge_for(&server, window);

        let result = bridge.download_file("doc-7", "bundle").await;

        assert_eq!(result, Some(first.to_string_lossy().into_owned()));
        assert_eq!(std::fs::read(&first).unwrap(), b"abc");
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn test_repeated_download_overwrites_destination() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.zip");
        std::fs::write(&target, b"stale content that is longer").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/download/doc-42")
            .with_status(200)
            .with_body("fresh")
            .expect(2)
            .create_async()
            .await;

        let window = FakeWindow::answering(DialogSelection::Single(target.clone()));
        let bridge = bridge_for(&server, window.clone());

        for _ in 0..2 {
            let result = bridge.download_file("doc-42", "report").await;
            assert_eq!(result, Some(target.to_string_lossy().into_owned()));
            assert_eq!(std::fs::read(&target).unwrap(), b"fresh");
        }

        assert_eq!(window.calls(), 2);
        assert_eq!(entries(dir.path()), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_write_failure_is_absence() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no-such-dir").join("report.zip");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/doc-42")
            .with_status(200)
            .with_body("data")
            .create_async()
            .await;

        let bridge = bridge_for(&server, FakeWindow::answering(DialogSelection::Single(target)));
        let outcome = bridge
            .download(DownloadRequest::new("doc-42", "report").unwrap())
            .await;

        assert_eq!(outcome, DownloadOutcome::failed(FailureReason::Write));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_dialog_error_is_absence() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/doc-42")
            .with_status(200)
            .with_body("data")
            .create_async()
            .await;

        let bridge = bridge_for(&server, FakeWindow::failing(HostError::EventLoopClosed));
        let outcome = bridge
            .download(DownloadRequest::new("doc-42", "report").unwrap())
            .await;

        assert_eq!(outcome, DownloadOutcome::failed(FailureReason::Dialog));
    }

    #[tokio::test]
    async fn test_empty_document_id_is_rejected_without_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let window = FakeWindow::answering(DialogSelection::Single(PathBuf::from("x.zip")));
        let bridge = bridge_for(&server, window.clone());

        assert_eq!(bridge.download_file("", "report").await, None);
        assert_eq!(window.calls(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    #[should_panic(expected = "before its host window was bound")]
    async fn test_download_before_binding_panics() {
        let backend = BackendConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let bridge = DownloadBridge::new(BridgeContext::new(backend));

        bridge.download_file("doc-42", "report").await;
    }

    #[tokio::test]
    #[should_panic(expected = "before its host window was bound")]
    async fn test_invalid_request_before_binding_panics() {
        let backend = BackendConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let bridge = DownloadBridge::new(BridgeContext::new(backend));

        bridge.download_outcome("", "report").await;
    }

    #[tokio::test]
    async fn test_deferred_binding() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("late.zip");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/download/doc-1")
            .with_status(200)
            .with_body("late")
            .create_async()
            .await;

        let backend = BackendConfig::new(Url::parse(&server.url()).unwrap());
        let bridge = DownloadBridge::new(BridgeContext::new(backend));
        bridge
            .context()
            .bind_window(FakeWindow::answering(DialogSelection::Single(target.clone())));

        let result = bridge.download_file("doc-1", "late").await;
        assert_eq!(result, Some(target.to_string_lossy().into_owned()));
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn test_second_binding_panics() {
        let backend = BackendConfig::new(Url::parse("http://localhost:8080").unwrap());
        let context = BridgeContext::with_window(backend, FakeWindow::answering(DialogSelection::None));

        context.bind_window(FakeWindow::answering(DialogSelection::None));
    }
}
