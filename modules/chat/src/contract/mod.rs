pub mod client;
pub mod error;
pub mod model;

pub use client::ChatApi;
pub use error::ChatError;
pub use model::{Chat, InboxEntry, Message, OpenedChat};
