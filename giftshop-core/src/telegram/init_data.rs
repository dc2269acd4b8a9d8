use chrono::{DateTime, Utc};
use http::HeaderMap;
use tracing::warn;

use giftshop_common::models::TelegramUser;

use crate::Error;

/// Header the Mini-App client forwards `Telegram.WebApp.initData` in.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// `Authorization: tma <initData>` is accepted as well.
const AUTH_SCHEME: &str = "tma ";

/// Parsed Mini-App launch parameters. The signature is carried but not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    pub raw: String,
    pub user: Option<TelegramUser>,
    pub auth_date: Option<DateTime<Utc>>,
    pub query_id: Option<String>,
    pub start_param: Option<String>,
    pub hash: Option<String>,
}

impl InitData {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Parse("empty init data".into()));
        }

        let mut data = InitData {
            raw: raw.to_string(),
            user: None,
            auth_date: None,
            query_id: None,
            start_param: None,
            hash: None,
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "user" => data.user = Some(serde_json::from_str::<TelegramUser>(&value)?),
                "auth_date" => {
                    let secs: i64 = value
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad auth_date '{}'", value)))?;
                    data.auth_date = DateTime::<Utc>::from_timestamp(secs, 0);
                }
                "query_id" => data.query_id = Some(value.into_owned()),
                "start_param" => data.start_param = Some(value.into_owned()),
                "hash" => data.hash = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(data)
    }

    /// Reads init data from request headers. Absent or malformed input yields
    /// `None` and a warning, so pages that only personalize can still render.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers
            .get(INIT_DATA_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get(http::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix(AUTH_SCHEME))
                    .map(str::to_string)
            });

        let Some(raw) = raw else {
            warn!("No Telegram init data on request");
            return None;
        };

        match InitData::parse(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Ignoring malformed Telegram init data: {}", e);
                None
            }
        }
    }
}
