//! Transient user-facing notices: failed backend round trips and sign-out.

use crate::types::notice::{Notice, NoticeLevel};

#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            level,
            message: message.into(),
        });
        self.next_id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message)
    }

    /// Removes a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}
