//! Streaming downloads with fractional progress.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::NetError;

/// Size of each write to disk, and the progress reporting granularity.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// What a finished download wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub bytes: u64,
    /// `Content-Length` as declared by the server, if any.
    pub total: Option<u64>,
}

static NEXT_PART: AtomicU64 = AtomicU64::new(0);

/// Fresh temporary sibling for a download to stream into before it is
/// renamed onto `dest`.
///
/// Every call returns a new name, so overlapping downloads to the same
/// destination each own their file and the last rename wins.
pub fn part_path(dest: &Path) -> PathBuf {
    let n = NEXT_PART.fetch_add(1, Ordering::Relaxed);
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}-{n}.part", std::process::id()));
    dest.with_file_name(name)
}

/// Streams HTTP resources to local files.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Downloads `url` to `dest`.
    ///
    /// A non-2xx status fails before any file is created. The body goes to
    /// a private [`part_path`] first and only replaces `dest` once
    /// complete, so a failed download leaves `dest` absent or untouched.
    ///
    /// `on_progress` receives `bytes / total` after every chunk when the
    /// server declares a size, and is never called otherwise.
    pub async fn download<P, S>(
        &self,
        url: &str,
        dest: &Path,
        mut on_progress: P,
        mut on_status: S,
    ) -> Result<DownloadSummary, NetError>
    where
        P: FnMut(f64) + Send,
        S: FnMut(&str) + Send,
    {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Status {
                url: url.to_string(),
                status,
            });
        }

        let total = response.content_length().filter(|n| *n > 0);
        on_status("Downloading…");
        debug!(url, ?total, dest = %dest.display(), "download started");

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let part = part_path(dest);
        let bytes = match stream_to_file(response, &part, total, &mut on_progress).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }

        info!(url, bytes, dest = %dest.display(), "download finished");
        Ok(DownloadSummary {
            path: dest.to_path_buf(),
            bytes,
            total,
        })
    }
}

async fn stream_to_file<P>(
    mut response: reqwest::Response,
    path: &Path,
    total: Option<u64>,
    on_progress: &mut P,
) -> Result<u64, NetError>
where
    P: FnMut(f64) + Send,
{
    let mut file = tokio::fs::File::create(path).await?;
    let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE * 2);
    let mut written = 0u64;

    while let Some(bytes) = response.chunk().await? {
        pending.extend_from_slice(&bytes);
        while pending.len() >= CHUNK_SIZE {
            file.write_all(&pending[..CHUNK_SIZE]).await?;
            pending.drain(..CHUNK_SIZE);
            written += CHUNK_SIZE as u64;
            report(written, total, on_progress);
        }
    }

    if !pending.is_empty() {
        file.write_all(&pending).await?;
        written += pending.len() as u64;
        report(written, total, on_progress);
    }

    file.flush().await?;
    file.sync_all().await?;

    if let Some(expected) = total {
        if written < expected {
            return Err(NetError::Incomplete {
                expected,
                received: written,
            });
        }
    }
    Ok(written)
}

fn report<P: FnMut(f64)>(written: u64, total: Option<u64>, on_progress: &mut P) {
    if let Some(total) = total {
        on_progress((written as f64 / total as f64).min(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{response, serve};
    use crate::{HttpConfig, build_client};

    fn downloader() -> Downloader {
        Downloader::new(build_client(&HttpConfig::default()).unwrap())
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn leftover_parts(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.to_string_lossy().ends_with(".part"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn known_size_reports_monotonic_progress_to_one() {
        let body = payload(CHUNK_SIZE * 3 + 1234);
        let url = serve(response("200 OK", Some(body.len()), &body)).await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("nested").join("dir").join("update.zip");

        let mut progress = Vec::new();
        let mut statuses = Vec::new();
        let summary = downloader()
            .download(&url, &dest, |p| progress.push(p), |s| statuses.push(s.to_string()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert_eq!(summary.bytes, body.len() as u64);
        assert_eq!(summary.total, Some(body.len() as u64));
        assert_eq!(progress.len(), 4);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert_eq!(*progress.last().unwrap(), 1.0);
        assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(statuses, vec!["Downloading…".to_string()]);
        assert!(leftover_parts(dest.parent().unwrap()).is_empty());
    }

    #[tokio::test]
    async fn unknown_size_never_reports_progress() {
        let body = payload(CHUNK_SIZE + 10);
        let url = serve(response("200 OK", None, &body)).await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("file.bin");

        let mut calls = 0;
        let summary = downloader()
            .download(&url, &dest, |_| calls += 1, |_| {})
            .await
            .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.total, None);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn not_found_leaves_dest_absent() {
        let url = serve(response("404 Not Found", Some(9), b"not found")).await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("update.zip");

        let err = downloader()
            .download(&url, &dest, |_| {}, |_| {})
            .await
            .unwrap_err();

        match err {
            NetError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error {other}"),
        }
        assert!(!dest.exists());
        assert!(leftover_parts(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn server_error_leaves_existing_dest_unchanged() {
        let url = serve(response("500 Internal Server Error", Some(0), b"")).await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("update.zip");
        std::fs::write(&dest, b"previous build").unwrap();

        assert!(
            downloader()
                .download(&url, &dest, |_| {}, |_| {})
                .await
                .is_err()
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous build");
    }

    #[tokio::test]
    async fn truncated_body_is_discarded() {
        let url = serve(response("200 OK", Some(100_000), b"only a little")).await;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("update.zip");

        let result = downloader().download(&url, &dest, |_| {}, |_| {}).await;

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(leftover_parts(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let tmp = tempfile::tempdir().unwrap();
        let err = downloader()
            .download(&format!("http://{addr}/x"), &tmp.path().join("x"), |_| {}, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Http(_)));
    }

    #[test]
    fn part_path_is_fresh_sibling() {
        let dest = Path::new("/tmp/dl/update.zip");
        let a = part_path(dest);
        let b = part_path(dest);

        assert_ne!(a, b);
        for part in [&a, &b] {
            assert_eq!(part.parent(), dest.parent());
            let name = part.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("update.zip."), "{name}");
            assert!(name.ends_with(".part"), "{name}");
        }
    }

    /// Sends the head and the first half of `body`, then waits for
    /// `release` before sending the rest.
    async fn serve_paused(body: Vec<u8>, release: tokio::sync::oneshot::Receiver<()>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let half = body.len() / 2;
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body[..half]).await.unwrap();
            socket.flush().await.unwrap();
            let _ = release.await;
            socket.write_all(&body[half..]).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/slow.zip")
    }

    #[tokio::test]
    async fn overlapping_downloads_to_one_dest_last_finisher_wins() {
        let first_body = vec![b'a'; CHUNK_SIZE * 4];
        let second_body = vec![b'b'; CHUNK_SIZE * 4];
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let slow_url = serve_paused(first_body.clone(), release_rx).await;
        let fast_url = serve(response("200 OK", Some(second_body.len()), &second_body)).await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("update.zip");

        // Start the slow download and wait until half of it is on disk.
        let (halfway_tx, mut halfway_rx) = tokio::sync::mpsc::unbounded_channel();
        let slow = {
            let downloader = downloader();
            let dest = dest.clone();
            tokio::spawn(async move {
                let on_progress = |p: f64| {
                    let _ = halfway_tx.send(p);
                };
                downloader.download(&slow_url, &dest, on_progress, |_| {}).await
            })
        };
        while let Some(p) = halfway_rx.recv().await {
            if p >= 0.5 {
                break;
            }
        }

        // A second download to the same destination runs to completion.
        let fast = downloader().download(&fast_url, &dest, |_| {}, |_| {}).await;
        assert_eq!(fast.unwrap().bytes, second_body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), second_body);

        // The slow one finishes last and its complete body replaces it.
        release_tx.send(()).unwrap();
        let slow = slow.await.unwrap();
        assert_eq!(slow.unwrap().bytes, first_body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), first_body);
        assert!(leftover_parts(tmp.path()).is_empty());
    }
}
