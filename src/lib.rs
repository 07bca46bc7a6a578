// todostore - to-do list manager over a local persistence slot

pub mod config;
pub mod error;
pub mod filter;
pub mod slot;
pub mod store;
pub mod task;
pub mod transfer;
pub mod view;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::TaskError;
pub use filter::Filter;
pub use slot::{JsonFileSlot, MemorySlot, Slot, SqliteSlot};
pub use store::{Stats, TaskStore};
pub use task::{MAX_TEXT_LEN, Task};
pub use view::{Notice, NoticeKind, View};
