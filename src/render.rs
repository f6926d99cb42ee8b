//! Media-load retry policy for rendering surfaces
//!
//! When the current wallpaper fails to load, the surface asks for a new
//! selection instead of retrying the same broken resource. After a bounded
//! number of attempts it gives up and keeps whatever it last showed.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{MediaKind, Record, Selection};
use crate::scheduler::{SelectorError, SelectorResult};

/// Total load attempts, including the first
pub const MAX_LOAD_ATTEMPTS: u32 = 3;

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Why a single media load failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Media request failed for {url}: {reason}")]
    Failed { url: String, reason: String },

    #[error("Media server returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Media server returned {content_type:?} for {kind} resource {url}")]
    ContentType {
        url: String,
        kind: MediaKind,
        content_type: String,
    },
}

/// Errors from [`load_with_reselect`]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Every attempt failed to load
    #[error("Gave up after {attempts} load attempts: {last}")]
    Exhausted { attempts: u32, last: LoadError },

    /// A replacement could not be selected
    #[error("Reselection failed: {0}")]
    Selector(#[from] SelectorError),
}

/// Something that can load a record's media
#[async_trait]
pub trait MediaLoader: Send + Sync {
    async fn load(&self, record: &Record) -> Result<(), LoadError>;
}

/// Configuration for reselect-on-failure behavior
#[derive(Debug, Clone)]
pub struct ReselectConfig {
    /// Total load attempts, including the first
    pub max_attempts: u32,

    /// Pause before each reselection
    pub delay: Duration,
}

impl Default for ReselectConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_LOAD_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

/// A selection that loaded, and how many attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub selection: Selection,
    pub attempts: u32,
}

/// Load `initial`, reselecting after each failure
///
/// # Arguments
///
/// * `config` - Attempt budget and pause between attempts
/// * `loader` - Loads one record's media
/// * `initial` - The selection to try first
/// * `reselect` - Produces a replacement selection after a failure
///
/// # Returns
///
/// The first selection that loaded, or the last load error once the
/// budget is spent. Reselection errors end the loop immediately.
pub async fn load_with_reselect<L, F, Fut>(
    config: &ReselectConfig,
    loader: &L,
    initial: Selection,
    reselect: F,
) -> RenderResult<Loaded>
where
    L: MediaLoader + ?Sized,
    F: Fn() -> Fut,
    Fut: Future<Output = SelectorResult<Selection>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut selection = initial;
    let mut attempt = 1;

    loop {
        match loader.load(&selection.record).await {
            Ok(()) => {
                if attempt > 1 {
                    debug!(attempt, "Media loaded after reselection");
                }
                return Ok(Loaded {
                    selection,
                    attempts: attempt,
                });
            }
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Media failed to load");
                if attempt >= max_attempts {
                    return Err(RenderError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
            }
        }

        if !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        selection = reselect().await?;
        attempt += 1;
    }
}

/// Loader that checks media availability over HTTP
///
/// Any 2xx or 3xx status counts as available. With
/// [`HttpMediaLoader::require_media_type`] the `Content-Type` must also match
/// the record's kind (`image/...` or `video/...`).
pub struct HttpMediaLoader {
    client: reqwest::Client,
    require_media_type: bool,
}

impl HttpMediaLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pinwall/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            require_media_type: false,
        })
    }

    pub fn require_media_type(mut self) -> Self {
        self.require_media_type = true;
        self
    }

    fn check_content_type(&self, record: &Record, response: &reqwest::Response) -> Result<(), LoadError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains(record.media_kind.as_str()) {
            return Ok(());
        }
        Err(LoadError::ContentType {
            url: record.url.clone(),
            kind: record.media_kind,
            content_type,
        })
    }
}

#[async_trait]
impl MediaLoader for HttpMediaLoader {
    async fn load(&self, record: &Record) -> Result<(), LoadError> {
        let response = self
            .client
            .get(&record.url)
            .send()
            .await
            .map_err(|e| LoadError::Failed {
                url: record.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(LoadError::Status {
                url: record.url.clone(),
                status: status.as_u16(),
            });
        }

        if self.require_media_type {
            self.check_content_type(record, &response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fails for every URL in the broken set
    struct FakeLoader {
        broken: HashSet<String>,
        calls: AtomicUsize,
    }

    impl FakeLoader {
        fn new(broken: &[&str]) -> Self {
            Self {
                broken: broken.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaLoader for FakeLoader {
        async fn load(&self, record: &Record) -> Result<(), LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&record.url) {
                Err(LoadError::Status {
                    url: record.url.clone(),
                    status: 404,
                })
            } else {
                Ok(())
            }
        }
    }

    fn selection(url: &str, index: usize) -> Selection {
        Selection::new(Record::new(url), index)
    }

    #[tokio::test]
    async fn test_first_load_succeeds() {
        let loader = FakeLoader::new(&[]);
        let reselects = AtomicUsize::new(0);
        let counter = &reselects;

        let loaded = load_with_reselect(&ReselectConfig::default(), &loader, selection("ok", 0), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(selection("other", 1))
        })
        .await
        .unwrap();

        assert_eq!(loaded.attempts, 1);
        assert_eq!(loaded.selection.record.url, "ok");
        assert_eq!(reselects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reselects_until_success() {
        let loader = FakeLoader::new(&["bad-0", "bad-1"]);
        let next = Arc::new(AtomicUsize::new(1));

        let loaded = load_with_reselect(&ReselectConfig::default(), &loader, selection("bad-0", 0), || {
            let next = Arc::clone(&next);
            async move {
                let i = next.fetch_add(1, Ordering::SeqCst);
                let url = if i < 2 { format!("bad-{i}") } else { "good".to_string() };
                Ok(selection(&url, i))
            }
        })
        .await
        .unwrap();

        assert_eq!(loaded.attempts, 3);
        assert_eq!(loaded.selection.record.url, "good");
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let loader = FakeLoader::new(&["bad"]);

        let result = load_with_reselect(&ReselectConfig::default(), &loader, selection("bad", 0), || async {
            Ok(selection("bad", 0))
        })
        .await;

        assert!(matches!(result, Err(RenderError::Exhausted { attempts: 3, .. })));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reselect_failure_stops() {
        let loader = FakeLoader::new(&["bad"]);

        let result = load_with_reselect(&ReselectConfig::default(), &loader, selection("bad", 0), || async {
            Err(SelectorError::NoRecords)
        })
        .await;

        assert!(matches!(result, Err(RenderError::Selector(SelectorError::NoRecords))));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_loader_checks_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpMediaLoader::new(Duration::from_secs(5)).unwrap();

        let ok = Record::new(format!("{}/ok.jpg", server.uri()));
        assert!(loader.load(&ok).await.is_ok());

        let gone = Record::new(format!("{}/gone.jpg", server.uri()));
        assert!(matches!(
            loader.load(&gone).await,
            Err(LoadError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_loader_checks_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/expired.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .mount(&server)
            .await;

        let loader = HttpMediaLoader::new(Duration::from_secs(5))
            .unwrap()
            .require_media_type();

        assert!(loader.load(&Record::new(format!("{}/photo.jpg", server.uri()))).await.is_ok());
        assert!(loader.load(&Record::new(format!("{}/clip.mp4", server.uri()))).await.is_ok());
        assert!(matches!(
            loader.load(&Record::new(format!("{}/expired.jpg", server.uri()))).await,
            Err(LoadError::ContentType { kind: MediaKind::Image, .. })
        ));
    }
}
