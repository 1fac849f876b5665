//! Parse HTTP response header lines.

/// Extract `Content-Length` from collected header lines.
///
/// Header blocks of earlier (redirect) responses are discarded whenever a new
/// status line starts, so only the final response counts.
pub(crate) fn content_length(lines: &[String]) -> Option<u64> {
    let mut content_length = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            content_length = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.trim().parse::<u64>() {
                    content_length = Some(n);
                }
            }
        }
    }
    content_length
}

/// Status code of the most recent status line (`HTTP/1.1 206 Partial Content` → 206).
pub(crate) fn last_status(lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}
