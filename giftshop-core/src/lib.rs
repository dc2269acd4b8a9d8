// src/lib.rs

pub mod db;
pub mod config;
pub mod startup;
pub mod repositories;
pub mod dialect;
pub mod telegram;
pub mod services;
pub mod http;
pub mod test_utils;

pub use db::Database;
pub use config::ShopConfig;
pub use giftshop_common::error::{Error, FieldErrors};
