use async_trait::async_trait;
use pagebrief_common::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::transport::{ChatTransport, MessageId};

/// Named stages of one pipeline run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ProgressStage {
    Downloading,
    Reading,
    Processing,
    AiAnalysis,
    Finalizing,
}

impl ProgressStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloading => "Downloading",
            Self::Reading => "Reading PDF",
            Self::Processing => "Processing",
            Self::AiAnalysis => "AI Analysis",
            Self::Finalizing => "Almost Done",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Downloading => "📥",
            Self::Reading => "📄",
            Self::Processing => "⚙️",
            Self::AiAnalysis => "🤖",
            Self::Finalizing => "📝",
        }
    }
}

/// The single live progress state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub stage: ProgressStage,
    pub detail: String,
}

impl ProgressState {
    /// Text shown to the user while the run is in flight
    pub fn render(&self) -> String {
        format!(
            "{} {}\n\n{}\n\nPlease wait...",
            self.stage.icon(),
            self.stage.label(),
            self.detail
        )
    }
}

/// Where progress updates are pushed
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn publish(&self, state: &ProgressState) -> Result<()>;
}

/// Renders progress by editing one chat message in place
pub struct MessageProgressSink {
    transport: Arc<dyn ChatTransport>,
    message_id: MessageId,
}

impl MessageProgressSink {
    pub fn new(transport: Arc<dyn ChatTransport>, message_id: MessageId) -> Self {
        Self {
            transport,
            message_id,
        }
    }
}

#[async_trait]
impl ProgressSink for MessageProgressSink {
    async fn publish(&self, state: &ProgressState) -> Result<()> {
        self.transport
            .edit_message(self.message_id, &state.render(), &[])
            .await
    }
}

/// Best-effort progress reporting for one pipeline run
///
/// Sink failures are logged and counted, never returned.
pub struct ProgressReporter {
    sink: Option<Arc<dyn ProgressSink>>,
    state: Mutex<Option<ProgressState>>,
    failed_updates: AtomicUsize,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink: Some(sink),
            state: Mutex::new(None),
            failed_updates: AtomicUsize::new(0),
        }
    }

    /// Reporter without a sink; states are only logged
    pub fn detached() -> Self {
        Self {
            sink: None,
            state: Mutex::new(None),
            failed_updates: AtomicUsize::new(0),
        }
    }

    /// Move to `stage` and publish it
    ///
    /// A stage earlier than the current one is ignored.
    pub async fn report(&self, stage: ProgressStage, detail: impl Into<String>) {
        let next = ProgressState {
            stage,
            detail: detail.into(),
        };

        {
            let mut current = self.lock_state();
            if let Some(prev) = current.as_ref() {
                if stage < prev.stage {
                    warn!("Ignoring backward progress {:?} -> {:?}", prev.stage, stage);
                    return;
                }
            }
            *current = Some(next.clone());
        }

        debug!("Progress: {} - {}", stage.label(), next.detail);
        self.publish(&next).await;
    }

    /// Replace the detail text of the current stage
    pub async fn update_detail(&self, detail: impl Into<String>) {
        let next = {
            let mut current = self.lock_state();
            match current.as_mut() {
                Some(state) => {
                    state.detail = detail.into();
                    state.clone()
                }
                None => return,
            }
        };

        self.publish(&next).await;
    }

    pub fn current(&self) -> Option<ProgressState> {
        self.lock_state().clone()
    }

    /// Number of sink updates that failed
    pub fn failed_updates(&self) -> usize {
        self.failed_updates.load(Ordering::Relaxed)
    }

    async fn publish(&self, state: &ProgressState) {
        let Some(sink) = &self.sink else {
            return;
        };

        if let Err(e) = sink.publish(state).await {
            self.failed_updates.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to update progress: {}", e);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<ProgressState>> {
        // State stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
