//! Observers that forward generator progress.

use storyloom_core::Stage;
use storyloom_interface::{GenerationEvent, GenerationObserver};
use tokio::sync::mpsc;
use tracing::trace;

/// Forwards every callback as a [`GenerationEvent`] over an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
///
/// # Examples
///
/// ```
/// use storyloom_core::Stage;
/// use storyloom_interface::{GenerationEvent, GenerationObserver};
/// use storyloom_narrative::ChannelObserver;
///
/// let (observer, mut events) = ChannelObserver::channel();
/// observer.on_stage_change(Stage::Cover, 50, "Painting the cover");
///
/// assert_eq!(
///     events.try_recv().unwrap(),
///     GenerationEvent::StageChanged {
///         stage: Stage::Cover,
///         progress: 50,
///         label: "Painting the cover".to_string(),
///     }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<GenerationEvent>,
}

impl ChannelObserver {
    /// Wrap an existing sender.
    pub fn new(sender: mpsc::UnboundedSender<GenerationEvent>) -> Self {
        Self { sender }
    }

    /// Create an observer and the receiver for its events.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    fn send(&self, event: GenerationEvent) {
        if self.sender.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}

impl GenerationObserver for ChannelObserver {
    fn on_stage_change(&self, stage: Stage, progress: u8, label: &str) {
        self.send(GenerationEvent::StageChanged {
            stage,
            progress,
            label: label.to_string(),
        });
    }

    fn on_progress(&self, progress: u8, label: &str) {
        self.send(GenerationEvent::Progress {
            progress,
            label: label.to_string(),
        });
    }

    fn on_asset_fixed(&self, original: &str, fixed: &str) {
        self.send(GenerationEvent::AssetFixed {
            original: original.to_string(),
            fixed: fixed.to_string(),
        });
    }
}
