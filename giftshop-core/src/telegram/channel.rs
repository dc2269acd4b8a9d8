use url::Url;

/// Derives a channel's identity from its public link: the last non-empty
/// path segment, without a leading `@`.
///
/// `https://t.me/examplechannel/` and `t.me/examplechannel?start=1` both give
/// `examplechannel`. Returns `None` when nothing usable is left, e.g. for a
/// bare host; callers turn that into a validation error.
pub fn channel_id_from_url(channel_url: &str) -> Option<String> {
    let trimmed = channel_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(handle) = trimmed.strip_prefix('@') {
        return non_empty(handle);
    }

    let parsed = Url::parse(trimmed).or_else(|_| Url::parse(&format!("https://{trimmed}"))).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    non_empty(segment.trim_start_matches('@'))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}
