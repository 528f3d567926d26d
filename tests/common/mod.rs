//! Common test utilities and helpers.

#![allow(dead_code)]

use centroid_finder_server::{
    config::{CommandConfig, Config},
    create_app,
};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener as TokioTcpListener;

/// Test server instance
pub struct TestServer {
    pub base_url: String,
    pub videos_dir: TempDir,
    pub results_dir: Option<TempDir>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Options for starting a test server
pub struct TestOptions {
    /// Mount `/results` on a temp dir
    pub results: bool,
    /// Centroid processor stand-in
    pub processor: CommandConfig,
    /// Thumbnail extractor stand-in
    pub thumbnail: CommandConfig,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            results: true,
            // Copies the video to the output path in place of a real CSV
            processor: CommandConfig::new("cp", &["{input}", "{output}"], 10),
            // Echoes the video bytes back as the "thumbnail"
            thumbnail: CommandConfig::new("cat", &["{input}"], 10),
        }
    }
}

impl TestServer {
    /// Start a test server with results served and stand-in programs
    pub async fn start() -> Self {
        Self::start_with(TestOptions::default()).await
    }

    /// Start a test server without a results directory
    pub async fn start_without_results() -> Self {
        Self::start_with(TestOptions {
            results: false,
            ..TestOptions::default()
        })
        .await
    }

    pub async fn start_with(options: TestOptions) -> Self {
        let port = get_available_port();
        let videos_dir = TempDir::new().expect("Failed to create videos dir");
        let results_dir = options
            .results
            .then(|| TempDir::new().expect("Failed to create results dir"));

        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.storage.videos_dir = videos_dir.path().to_path_buf();
        config.storage.results_dir = results_dir.as_ref().map(|d| d.path().to_path_buf());
        config.processing.processor = options.processor;
        config.processing.thumbnail = options.thumbnail;
        config.logging.level = "warn".to_string();

        let app = create_app(config);

        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let listener = TokioTcpListener::bind(addr)
            .await
            .expect("Failed to bind listener");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::select! {
                _ = axum::serve(listener, app) => {}
                _ = shutdown_rx => {}
            }
        });

        // Give the server time to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            videos_dir,
            results_dir,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Put a video file into the videos directory
    pub fn add_video(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.videos_dir.path().join(name), contents).expect("Failed to write video");
    }

    /// Put a file into the results directory
    pub fn add_result(&self, name: &str, contents: &[u8]) {
        let dir = self.results_path().expect("results directory not configured");
        std::fs::write(dir.join(name), contents).expect("Failed to write result");
    }

    pub fn results_path(&self) -> Option<&Path> {
        self.results_dir.as_ref().map(|d| d.path())
    }

    /// Poll a job until it leaves `processing`
    pub async fn wait_for_job(&self, job_id: &str) -> serde_json::Value {
        let client = self.client();
        for _ in 0..100 {
            let status: serde_json::Value = client
                .get(self.url(&format!("/process/{}/status", job_id)))
                .send()
                .await
                .expect("Failed to poll status")
                .json()
                .await
                .expect("Status was not JSON");

            if status["status"] != "processing" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} never finished", job_id);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Find an available TCP port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}
