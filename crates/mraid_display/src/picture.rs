//! Picture download pipeline
//!
//! `storePicture` fetches an image, follows at most one redirect, writes the
//! body into the picture directory and announces the file to the media
//! index. The work runs on a spawned task; its single outcome is handed back
//! to the control loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mraid_platform::{MediaIndex, MediaIndexConnection};
use percent_encoding::percent_decode_str;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ControllerConfig;
use crate::error::DownloadError;

/// User agent sent by [`ReqwestFetcher`]
pub const USER_AGENT: &str = concat!("mraid/", env!("CARGO_PKG_VERSION"));

/// Streaming response body
#[async_trait]
pub trait ResponseBody: Send {
    /// Next chunk of the body, `None` at the end
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, DownloadError>;
}

/// A response whose body has not been read yet
pub struct FetchedResponse {
    pub status: u16,
    /// Raw `Location` header
    pub location: Option<String>,
    /// Raw `Content-Type` header
    pub content_type: Option<String>,
    pub body: Box<dyn ResponseBody>,
}

impl FetchedResponse {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Performs a single GET without following redirects
#[async_trait]
pub trait PictureFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, DownloadError>;
}

/// Default fetcher over `reqwest`
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

struct ReqwestBody(reqwest::Response);

#[async_trait]
impl ResponseBody for ReqwestBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, DownloadError> {
        Ok(self.0.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl PictureFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, DownloadError> {
        let response = self.client.get(url.clone()).send().await?;
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let location = header(reqwest::header::LOCATION);
        let content_type = header(reqwest::header::CONTENT_TYPE);

        Ok(FetchedResponse {
            status: response.status().as_u16(),
            location,
            content_type,
            body: Box::new(ReqwestBody(response)),
        })
    }
}

/// File name for a downloaded picture
///
/// The percent-decoded last path segment of `url`, with `.<subtype>`
/// appended when the content type names an `image/<subtype>` and the name
/// lacks it. Names that would escape the picture directory are rejected.
pub fn picture_file_name(url: &Url, content_type: Option<&str>) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())?;
    let mut name = percent_decode_str(segment).decode_utf8_lossy().into_owned();
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return None;
    }

    if let Some(subtype) = content_type.and_then(image_subtype) {
        let extension = format!(".{subtype}");
        if !name.ends_with(&extension) {
            name.push_str(&extension);
        }
    }

    Some(name)
}

fn image_subtype(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find(|field| field.contains("image/"))
        .and_then(|field| field.split('/').nth(1))
        .map(str::trim)
        .filter(|subtype| !subtype.is_empty())
}

/// Media index connection that disconnects when dropped
struct ScanSession {
    connection: Option<Box<dyn MediaIndexConnection>>,
}

impl ScanSession {
    async fn open(index: &dyn MediaIndex) -> mraid_platform::Result<Self> {
        Ok(Self {
            connection: Some(index.connect().await?),
        })
    }

    async fn scan(&mut self, path: &Path, mime_type: Option<&str>) -> mraid_platform::Result<()> {
        match self.connection.as_mut() {
            Some(connection) => connection.scan_file(path, mime_type).await,
            None => Ok(()),
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.disconnect();
        }
    }
}

/// Downloads pictures into one directory
#[derive(Clone)]
pub struct PictureDownloader {
    fetcher: Arc<dyn PictureFetcher>,
    media_index: Arc<dyn MediaIndex>,
    directory: PathBuf,
}

impl PictureDownloader {
    pub fn new(
        fetcher: Arc<dyn PictureFetcher>,
        media_index: Arc<dyn MediaIndex>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            media_index,
            directory: directory.into(),
        }
    }

    /// Downloader with the default HTTP fetcher
    pub fn from_config(
        config: &ControllerConfig,
        media_index: Arc<dyn MediaIndex>,
    ) -> Result<Self, DownloadError> {
        let fetcher = ReqwestFetcher::new(config.http_timeout_duration())?;
        Ok(Self::new(
            Arc::new(fetcher),
            media_index,
            config.picture_directory.clone(),
        ))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Download `uri` and return the saved file
    ///
    /// Partially written files are left in place on failure.
    pub async fn download(&self, uri: &str) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let mut url = Url::parse(uri)?;
        let mut response = self.fetcher.fetch(&url).await?;

        if let Some(location) = response.location.take() {
            url = url.join(&location)?;
            if response.is_redirect() {
                debug!(%url, "Following picture redirect");
                response = self.fetcher.fetch(&url).await?;
            }
        }

        if response.status >= 400 {
            return Err(DownloadError::Status(response.status));
        }

        let content_type = response.content_type.as_deref();
        let file_name = picture_file_name(&url, content_type)
            .ok_or_else(|| DownloadError::NoFileName(url.to_string()))?;
        let mime_type = content_type
            .and_then(image_subtype)
            .map(|subtype| format!("image/{subtype}"));
        let path = self.directory.join(file_name);

        let mut file = tokio::fs::File::create(&path).await?;
        while let Some(chunk) = response.body.next_chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        self.register(&path, mime_type.as_deref()).await;
        info!(path = %path.display(), "Picture saved");
        Ok(path)
    }

    /// Run [`download`](Self::download) on the current tokio runtime
    ///
    /// `on_done` receives exactly one outcome, including for a panicked
    /// download task.
    pub fn spawn<F>(&self, uri: String, on_done: F) -> Result<(), DownloadError>
    where
        F: FnOnce(Result<PathBuf, DownloadError>) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DownloadError::NoRuntime)?;
        let downloader = self.clone();

        runtime.spawn(async move {
            let task = tokio::spawn(async move { downloader.download(&uri).await });
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(DownloadError::TaskFailed(err.to_string())),
            };
            on_done(outcome);
        });
        Ok(())
    }

    async fn register(&self, path: &Path, mime_type: Option<&str>) {
        let mut session = match ScanSession::open(self.media_index.as_ref()).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Media index unavailable");
                return;
            }
        };
        if let Err(err) = session.scan(path, mime_type).await {
            warn!(error = %err, path = %path.display(), "Media scan failed");
        }
    }
}
