//! Debounced conversion for live editing.
//!
//! Every keystroke can be handed to [`ConversionDriver::submit`]; only the
//! last edit in a burst is converted, and a result that finishes after a
//! newer edit arrived is discarded instead of published.

use crate::{DocumentNode, Options, ParseResult, SerializeError, parse_document, serialize};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

/// Quiet period before a submitted edit is converted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Parser switches used for every conversion.
    pub options: Options,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            options: Options::default(),
        }
    }
}

impl DriverConfig {
    /// The debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Errors from the async wrappers.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The blocking task panicked or was cancelled.
    #[error("conversion task failed: {0}")]
    Join(#[from] JoinError),
    /// The document could not be written.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// [`parse_document`] on the blocking pool.
pub async fn parse_mdx_async(
    source: impl Into<String>,
    options: Options,
) -> Result<ParseResult, DriverError> {
    let source = source.into();
    let result = tokio::task::spawn_blocking(move || parse_document(&source, &options)).await?;
    Ok(result)
}

/// [`serialize`] on the blocking pool.
pub async fn serialize_async(doc: DocumentNode) -> Result<String, DriverError> {
    let text = tokio::task::spawn_blocking(move || serialize(&doc)).await??;
    Ok(text)
}

/// What happened to one submitted edit.
#[derive(Debug, Clone)]
pub enum DriverOutcome {
    /// Converted and published.
    Applied(Arc<ParseResult>),
    /// A newer edit arrived first; nothing was published.
    Superseded,
    /// The conversion task itself failed.
    Failed(String),
}

/// Debounces edits and publishes the newest conversion on a watch channel.
#[derive(Debug, Clone)]
pub struct ConversionDriver {
    config: DriverConfig,
    generation: Arc<AtomicU64>,
    sender: Arc<watch::Sender<Option<Arc<ParseResult>>>>,
}

impl ConversionDriver {
    /// Creates a driver with nothing published yet.
    pub fn new(config: DriverConfig) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            config,
            generation: Arc::new(AtomicU64::new(0)),
            sender: Arc::new(sender),
        }
    }

    /// Receiver that sees every published result.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ParseResult>>> {
        self.sender.subscribe()
    }

    /// The last published result.
    pub fn latest(&self) -> Option<Arc<ParseResult>> {
        self.sender.borrow().clone()
    }

    /// Number of edits submitted so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Schedules a conversion of `source`. Must be called inside a tokio
    /// runtime.
    pub fn submit(&self, source: impl Into<String>) -> JoinHandle<DriverOutcome> {
        let source = source.into();
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let sender = Arc::clone(&self.sender);
        let debounce = self.config.debounce();
        let options = self.config.options;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if generation.load(Ordering::SeqCst) != ticket {
                log::debug!("edit {ticket} superseded before conversion");
                return DriverOutcome::Superseded;
            }

            let result = match parse_mdx_async(source, options).await {
                Ok(result) => Arc::new(result),
                Err(err) => {
                    log::warn!("edit {ticket} failed to convert: {err}");
                    return DriverOutcome::Failed(err.to_string());
                }
            };

            let published = sender.send_if_modified(|latest| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                *latest = Some(Arc::clone(&result));
                true
            });
            if published {
                DriverOutcome::Applied(result)
            } else {
                log::debug!("edit {ticket} superseded during conversion");
                DriverOutcome::Superseded
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    fn quick() -> ConversionDriver {
        ConversionDriver::new(DriverConfig {
            debounce_ms: 20,
            ..DriverConfig::default()
        })
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let result = parse_mdx_async("# Hi", Options::default()).await.unwrap();
        let doc = result.document().unwrap().clone();
        assert_eq!(doc.content[0].kind, NodeKind::Heading);
        assert_eq!(serialize_async(doc).await.unwrap(), "# Hi\n");
    }

    #[tokio::test]
    async fn test_serialize_async_reports_errors() {
        let err = serialize_async(DocumentNode::new(NodeKind::Paragraph))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Serialize(_)));
    }

    #[tokio::test]
    async fn test_burst_keeps_last_edit() {
        let driver = quick();
        let first = driver.submit("first");
        let second = driver.submit("second");
        assert_eq!(driver.generation(), 2);

        assert!(matches!(first.await.unwrap(), DriverOutcome::Superseded));
        let DriverOutcome::Applied(result) = second.await.unwrap() else {
            panic!("last edit should be applied");
        };
        assert_eq!(result.document().unwrap().text_content(), "second");
        let latest = driver.latest().unwrap();
        assert!(Arc::ptr_eq(&latest, &result));
    }

    #[tokio::test]
    async fn test_subscribers_see_results() {
        let driver = quick();
        let mut receiver = driver.subscribe();
        assert!(receiver.borrow().is_none());

        driver.submit("<Card>\n\nunclosed").await.unwrap();
        receiver.changed().await.unwrap();
        let published = receiver.borrow_and_update().clone().unwrap();
        assert!(published.parse_error().is_some());
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.debounce(), DEFAULT_DEBOUNCE);
        let parsed: DriverConfig = serde_json::from_str(r#"{"debounceMs": 5}"#).unwrap();
        assert_eq!(parsed.debounce(), Duration::from_millis(5));
        assert!(parsed.options.gfm);
    }
}
