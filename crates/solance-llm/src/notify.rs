use solance_core::models::notice::Notice;
use tokio::sync::mpsc;
use tracing::debug;

/// Sends transient notices to whichever UI is listening. With no listener
/// (or a dropped receiver) notices are only logged.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<Notice>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, notice: Notice) {
        debug!(%notice, "notice");
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(notice).is_err() {
            debug!("notice receiver dropped");
        }
    }
}
