// Presentation callbacks invoked by the store after each mutation

use crate::store::Stats;
use crate::task::Task;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Observer that redraws itself whenever the store changes
///
/// Implementations must not call back into the store; they only see
/// snapshots of its state.
pub trait View {
    /// Draw the tasks selected by the current filter
    fn render(&mut self, tasks: &[Task]);

    fn update_stats(&mut self, stats: Stats);

    fn show_notice(&mut self, notice: &Notice);
}
