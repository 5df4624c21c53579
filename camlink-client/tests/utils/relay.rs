use std::net::SocketAddr;

use camlink_server::{RelayConfig, RelayServer};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Real relay on an ephemeral port.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub upload_dir: TempDir,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestRelay {
    pub async fn start() -> anyhow::Result<Self> {
        let upload_dir = tempfile::tempdir()?;
        let config = RelayConfig {
            bind_addr: "127.0.0.1:0".parse()?,
            upload_dir: upload_dir.path().to_path_buf(),
            ..RelayConfig::default()
        };

        let server = RelayServer::bind(config).await?;
        let addr = server.local_addr()?;
        let handle = tokio::spawn(server.run());

        Ok(Self {
            addr,
            upload_dir,
            handle,
        })
    }

    pub fn camera_url(&self) -> String {
        format!("ws://{}/camera", self.addr)
    }

    pub fn viewer_url(&self) -> String {
        format!("ws://{}/viewer", self.addr)
    }

    pub fn upload_url(&self) -> String {
        format!("http://{}/upload", self.addr)
    }

    /// Polls `/status` until the relay has registered the given sockets.
    pub async fn wait_for_counts(&self, cameras: u64, viewers: u64) -> anyhow::Result<()> {
        let url = format!("http://{}/status", self.addr);
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);

        loop {
            let status: serde_json::Value = reqwest::get(&url).await?.json().await?;
            if status["cameras"] == cameras && status["viewers"] == viewers {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("relay status stuck at {status}");
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.upload_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A local port nothing listens on.
pub async fn dead_port() -> anyhow::Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
