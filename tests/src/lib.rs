//! Harness running the reference server in-process for end-to-end tests.

use {
    anyhow::{Result, format_err},
    ownproof_sdk::{ProtocolController, client::Client, pow::BlockSize},
    ownproof_server::Config,
    std::{net::SocketAddr, path::PathBuf, time::Duration},
    tempfile::TempDir,
    tokio::{net::TcpListener, sync::oneshot, task::JoinHandle},
    tracing::debug,
    tracing_subscriber::EnvFilter,
    url::Url,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestServer {
    url: Url,
    dir: TempDir,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(BlockSize::default()).await
    }

    /// Starts a server on an ephemeral local port with storage in a fresh
    /// temporary directory.
    pub async fn start_with(block_size: BlockSize) -> Result<Self> {
        init_logger();
        let dir = TempDir::new()?;
        let storage_path = dir.path().join("storage");
        fs_err::create_dir(&storage_path)?;

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let config: Config = json5::from_str(&format!(
            "{{ bind_addr: {:?}, storage_path: {:?}, block_size: {} }}",
            addr.to_string(),
            storage_path.display().to_string(),
            block_size.get(),
        ))?;
        debug!(?config, "starting test server");

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            ownproof_server::serve(listener, &config, async {
                let _ = shutdown_rx.await;
            })
            .await
        });
        Ok(Self {
            url: format!("http://{addr}/").parse()?,
            dir,
            shutdown,
            task,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    /// Path for a scratch file outside of the server storage.
    #[must_use]
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn client(&self) -> Result<Client> {
        Ok(Client::new(self.url.clone(), REQUEST_TIMEOUT)?)
    }

    pub fn controller(&self) -> Result<ProtocolController<Client>> {
        self.controller_with(BlockSize::default())
    }

    pub fn controller_with(&self, block_size: BlockSize) -> Result<ProtocolController<Client>> {
        Ok(ProtocolController::new(self.client()?, block_size))
    }

    pub async fn stop(self) -> Result<()> {
        self.shutdown
            .send(())
            .map_err(|()| format_err!("server already stopped"))?;
        self.task.await?
    }
}

/// Deterministic content that differs between blocks.
#[must_use]
pub fn patterned_content(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect()
}

fn init_logger() {
    // Several tests in one binary race to install the subscriber.
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("info,ownproof_server=debug,ownproof_sdk=debug"))
        .try_init();
}
