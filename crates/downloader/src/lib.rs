mod errors;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub use errors::{DownloaderError, Result};

use agon_core::{RequestDescriptor, Session};
use futures_util::StreamExt;
use reqwest::Url;
use reqwest::header::{HeaderValue, REFERER};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Progress notifications emitted while streaming.
///
/// `Progress` fires after each sink write completes, i.e. every time the
/// write buffer is ready for more data. It is a flow-control signal, not a
/// fixed-size chunk counter.
#[derive(Debug, Clone, Copy)]
pub enum DownloadEvent {
    Started {
        total_bytes: Option<u64>,
    },
    Progress {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        elapsed: Duration,
    },
    Finished {
        downloaded_bytes: u64,
        elapsed: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Episode view url the site expects as the `Referer` of the media GET.
    pub referer: String,
    pub output: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        referer: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            referer: referer.into(),
            output: output.into(),
        }
    }
}

/// Streams a resolved media url into a file, creating parent directories.
pub async fn download(
    session: &Session,
    request: DownloadRequest,
    on_event: impl FnMut(DownloadEvent),
) -> Result<u64> {
    ensure_parent_dir(&request.output).await?;
    let mut file = File::create(&request.output)
        .await
        .map_err(|source| DownloaderError::Io {
            context: format!("creating output file {}", request.output.display()),
            source,
        })?;

    download_to_sink(session, &request.url, &request.referer, &mut file, on_event).await
}

/// Streams the authenticated media GET into any async sink.
///
/// The body is never buffered whole: one chunk is pulled, written, and only
/// then is the next chunk requested, so a slow sink throttles the transfer.
/// Sink write failures are returned, never swallowed.
pub async fn download_to_sink<W>(
    session: &Session,
    url: &str,
    referer: &str,
    sink: &mut W,
    mut on_event: impl FnMut(DownloadEvent),
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let target = Url::parse(url).map_err(|_| DownloaderError::InvalidUrl {
        url: url.to_string(),
    })?;

    let mut descriptor = RequestDescriptor::get(target);
    if let Ok(value) = HeaderValue::from_str(referer) {
        descriptor = descriptor.header(REFERER, value);
    }

    let context = format!("downloading {url}");
    let response = session.send(descriptor, &context).await?;
    let total_bytes = response.content_length();

    info!(url, total_bytes, "download started");
    on_event(DownloadEvent::Started { total_bytes });

    let started = Instant::now();
    let mut downloaded_bytes = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloaderError::Stream {
            context: context.clone(),
            source,
        })?;

        sink.write_all(&chunk)
            .await
            .map_err(|source| DownloaderError::Io {
                context: "writing to download sink".to_string(),
                source,
            })?;
        downloaded_bytes += chunk.len() as u64;

        on_event(DownloadEvent::Progress {
            downloaded_bytes,
            total_bytes,
            elapsed: started.elapsed(),
        });
    }

    sink.flush().await.map_err(|source| DownloaderError::Io {
        context: "flushing download sink".to_string(),
        source,
    })?;

    debug!(downloaded_bytes, "download finished");
    on_event(DownloadEvent::Finished {
        downloaded_bytes,
        elapsed: started.elapsed(),
    });

    Ok(downloaded_bytes)
}

async fn ensure_parent_dir(output: &Path) -> Result<()> {
    let Some(parent) = output.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| DownloaderError::Io {
            context: format!("creating output directory {}", parent.display()),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_core::{DEFAULT_USER_AGENT, MediaApiError};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session() -> Session {
        Session::new(DEFAULT_USER_AGENT).expect("session should build")
    }

    #[tokio::test]
    async fn streams_the_body_to_a_file_with_the_referer_header() {
        let payload: Vec<u8> = (0u32..4096).flat_map(|n| n.to_le_bytes()).collect();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/ep22.mp4"))
            .and(header("referer", "https://agonp.jp/episodes/view/22"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("rec.agonp").join("ep22.mp4");
        let request = DownloadRequest::new(
            format!("{}/media/ep22.mp4", server.uri()),
            "https://agonp.jp/episodes/view/22",
            output.clone(),
        );

        let mut events = Vec::new();
        let written = download(&test_session(), request, |event| events.push(event))
            .await
            .expect("download should pass");

        assert_eq!(written, payload.len() as u64);
        assert_eq!(tokio::fs::read(&output).await.expect("output exists"), payload);

        assert!(matches!(events.first(), Some(DownloadEvent::Started { .. })));
        assert!(matches!(events.last(), Some(DownloadEvent::Finished { .. })));
        let progress = events
            .iter()
            .filter(|event| matches!(event, DownloadEvent::Progress { .. }))
            .count();
        assert!(progress >= 1, "at least one write must be reported");
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/missing.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut sink = Vec::new();
        let err = download_to_sink(
            &test_session(),
            &format!("{}/media/missing.mp4", server.uri()),
            "https://agonp.jp/episodes/view/22",
            &mut sink,
            |_| {},
        )
        .await
        .expect_err("404 should fail");

        assert!(matches!(
            err,
            DownloaderError::Session(MediaApiError::HttpStatus { .. })
        ));
        assert!(sink.is_empty());
    }

    struct FailingSink;

    impl AsyncWrite for FailingSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("sink is full")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn sink_write_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/ep22.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1024]))
            .mount(&server)
            .await;

        let mut sink = FailingSink;
        let err = download_to_sink(
            &test_session(),
            &format!("{}/media/ep22.mp4", server.uri()),
            "https://agonp.jp/episodes/view/22",
            &mut sink,
            |_| {},
        )
        .await
        .expect_err("sink failure should fail the download");

        assert!(matches!(err, DownloaderError::Io { .. }));
    }

    #[tokio::test]
    async fn rejects_an_unparseable_url() {
        let mut sink = Vec::new();
        let err = download_to_sink(
            &test_session(),
            "not a url",
            "https://agonp.jp/episodes/view/22",
            &mut sink,
            |_| {},
        )
        .await
        .expect_err("bad url should fail");

        assert!(matches!(err, DownloaderError::InvalidUrl { .. }));
    }
}
