//! Destination client and retention runner abstractions
//!
//! The wire protocol of each remote store lives behind these traits, enabling
//! dependency injection and mocking for tests.

use crate::config::{DestinationKind, DestinationSettings, RetentionParameters, UploadConfig};
use crate::utils::progress::ProgressSink;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Readable archive stream handed to a client
pub type BackupStream<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

/// Connected client for one destination; released when dropped
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Upload `stream` to `key`, reporting cumulative bytes to `progress`.
    ///
    /// Must return an error whose root cause is
    /// [`OperationCancelled`](crate::error::OperationCancelled) promptly after
    /// `cancel` is triggered.
    async fn upload(
        &self,
        stream: BackupStream<'_>,
        key: &str,
        metadata: &HashMap<String, String>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Prunes destination-resident backups after a successful upload
#[async_trait]
pub trait RetentionRunner: Send + Sync {
    async fn run(&self, parameters: &RetentionParameters, client: &dyn DestinationClient) -> Result<()>;
}

/// Connects clients and hands out retention runners per destination kind
#[async_trait]
pub trait DestinationProvider: Send + Sync {
    async fn connect(
        &self,
        settings: &DestinationSettings,
        config: &UploadConfig,
    ) -> Result<Box<dyn DestinationClient>>;

    fn retention_runner(&self, kind: DestinationKind) -> Arc<dyn RetentionRunner>;
}

/// Mock implementation for testing
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use crate::error::OperationCancelled;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    /// Recorded provider/client call
    #[derive(Clone, Debug, PartialEq)]
    pub enum DestinationCall {
        Connect { kind: DestinationKind },
        Upload { kind: DestinationKind, key: String, bytes: u64, metadata: HashMap<String, String> },
        Retention { kind: DestinationKind, parameters: RetentionParameters },
        Released { kind: DestinationKind },
    }

    /// Scripted behaviour for one destination kind
    #[derive(Clone, Debug, Default)]
    pub enum MockBehavior {
        /// Read the whole stream, reporting progress per chunk
        #[default]
        Succeed,
        /// Fail the upload with the given message
        FailUpload(String),
        /// Fail while connecting
        FailConnect(String),
        /// Upload succeeds, retention fails
        FailRetention(String),
        /// Wait for the run token, then abort with a cancellation
        WaitForCancel,
        /// Time out internally after the given delay
        TimeOut(Duration),
    }

    /// Mock destination provider for testing
    #[derive(Clone, Default)]
    pub struct MockDestinations {
        /// Recorded calls in the order they happened
        pub calls: Arc<Mutex<Vec<DestinationCall>>>,
        behaviors: Arc<Mutex<HashMap<DestinationKind, MockBehavior>>>,
        chunk_size: usize,
    }

    impl MockDestinations {
        pub fn new() -> Self {
            Self {
                chunk_size: 8 * 1024,
                ..Default::default()
            }
        }

        /// Configure the behaviour of one destination kind
        pub fn expect(self, kind: DestinationKind, behavior: MockBehavior) -> Self {
            self.behaviors.lock().insert(kind, behavior);
            self
        }

        pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
            self.chunk_size = chunk_size.max(1);
            self
        }

        pub fn get_calls(&self) -> Vec<DestinationCall> {
            self.calls.lock().clone()
        }

        /// Kinds for which an upload was attempted
        pub fn uploaded_kinds(&self) -> Vec<DestinationKind> {
            let mut kinds: Vec<_> = self
                .calls
                .lock()
                .iter()
                .filter_map(|c| match c {
                    DestinationCall::Upload { kind, .. } => Some(*kind),
                    _ => None,
                })
                .collect();
            kinds.sort();
            kinds
        }

        pub fn connect_count(&self) -> usize {
            self.count(|c| matches!(c, DestinationCall::Connect { .. }))
        }

        pub fn release_count(&self) -> usize {
            self.count(|c| matches!(c, DestinationCall::Released { .. }))
        }

        pub fn retention_called(&self, kind: DestinationKind) -> bool {
            self.count(|c| matches!(c, DestinationCall::Retention { kind: k, .. } if *k == kind)) > 0
        }

        fn count(&self, predicate: impl Fn(&DestinationCall) -> bool) -> usize {
            self.calls.lock().iter().filter(|c| predicate(c)).count()
        }

        fn behavior(&self, kind: DestinationKind) -> MockBehavior {
            self.behaviors.lock().get(&kind).cloned().unwrap_or_default()
        }

        fn record_call(&self, call: DestinationCall) {
            self.calls.lock().push(call);
        }
    }

    #[async_trait]
    impl DestinationProvider for MockDestinations {
        async fn connect(
            &self,
            settings: &DestinationSettings,
            _config: &UploadConfig,
        ) -> Result<Box<dyn DestinationClient>> {
            let kind = settings.kind();
            self.record_call(DestinationCall::Connect { kind });

            if let MockBehavior::FailConnect(message) = self.behavior(kind) {
                anyhow::bail!("{}", message);
            }

            Ok(Box::new(MockClient {
                kind,
                behavior: self.behavior(kind),
                owner: self.clone(),
            }))
        }

        fn retention_runner(&self, kind: DestinationKind) -> Arc<dyn RetentionRunner> {
            Arc::new(MockRetention {
                kind,
                behavior: self.behavior(kind),
                owner: self.clone(),
            })
        }
    }

    struct MockClient {
        kind: DestinationKind,
        behavior: MockBehavior,
        owner: MockDestinations,
    }

    impl Drop for MockClient {
        fn drop(&mut self) {
            self.owner.record_call(DestinationCall::Released { kind: self.kind });
        }
    }

    #[async_trait]
    impl DestinationClient for MockClient {
        async fn upload(
            &self,
            stream: BackupStream<'_>,
            key: &str,
            metadata: &HashMap<String, String>,
            progress: &dyn ProgressSink,
            cancel: &CancellationToken,
        ) -> Result<()> {
            let mut uploaded = 0u64;
            let mut buffer = vec![0u8; self.owner.chunk_size.max(1)];

            match &self.behavior {
                MockBehavior::WaitForCancel => {
                    cancel.cancelled().await;
                    return Err(anyhow::Error::new(OperationCancelled).context("upload aborted"));
                }
                MockBehavior::TimeOut(after) => {
                    tokio::time::timeout(*after, std::future::pending::<()>()).await?;
                }
                MockBehavior::FailUpload(message) => anyhow::bail!("{}", message),
                _ => {}
            }

            loop {
                if cancel.is_cancelled() {
                    return Err(OperationCancelled.into());
                }
                let read = stream.read(&mut buffer).await?;
                if read == 0 {
                    break;
                }
                uploaded += read as u64;
                progress.on_progress(uploaded);
            }

            self.owner.record_call(DestinationCall::Upload {
                kind: self.kind,
                key: key.to_string(),
                bytes: uploaded,
                metadata: metadata.clone(),
            });
            Ok(())
        }
    }

    struct MockRetention {
        kind: DestinationKind,
        behavior: MockBehavior,
        owner: MockDestinations,
    }

    #[async_trait]
    impl RetentionRunner for MockRetention {
        async fn run(&self, parameters: &RetentionParameters, _client: &dyn DestinationClient) -> Result<()> {
            self.owner.record_call(DestinationCall::Retention {
                kind: self.kind,
                parameters: parameters.clone(),
            });
            if let MockBehavior::FailRetention(message) = &self.behavior {
                anyhow::bail!("{}", message);
            }
            Ok(())
        }
    }
}
