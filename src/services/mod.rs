//! Collaborators outside the core: the AI chat proxy and the upload file store.

pub mod chat;
pub mod files;

pub use chat::{ChatGenerator, ChatTurn, OpenAiChat};
pub use files::FileStore;
