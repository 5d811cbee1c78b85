use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    tx: Option<Sender<String>>,
}

impl ProgressSender {
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub(crate) fn new(tx: Sender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_some()
    }

    pub fn send(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(message.into());
        }
    }
}
