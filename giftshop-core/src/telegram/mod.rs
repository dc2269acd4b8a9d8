//! Telegram-facing helpers: init-data extraction and channel identity.

pub mod channel;
pub mod init_data;

pub use channel::channel_id_from_url;
pub use init_data::{InitData, INIT_DATA_HEADER};
