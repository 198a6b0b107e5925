use crate::error::{Result, WalletError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// System clipboard write access
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard kept in process memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    /// Refuse writes, as a browser does without clipboard permission
    deny_writes: AtomicBool,
}

impl MemoryClipboard {
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    pub fn set_deny_writes(&self, deny: bool) {
        self.deny_writes.store(deny, Ordering::SeqCst);
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(WalletError::Clipboard("write permission denied".to_string()));
        }
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}
