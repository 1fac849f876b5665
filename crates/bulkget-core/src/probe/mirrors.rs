//! Sequential mirror selection for one logical resource.

use crate::config::TransportOptions;
use crate::control::CancelToken;

use super::{probe_cancellable, ProbeOutcome};

/// Mirror that answered for a resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMirror {
    pub url: String,
    pub content_length: u64,
}

/// Join a mirror base with a relative resource path
/// (`https://m1.example/libs` + `a/b.jar` → `https://m1.example/libs/a/b.jar`).
///
/// Returns `None` if the host is not a valid absolute URL.
pub fn mirror_url(host: &str, relative_path: &str) -> Option<String> {
    let mut base = url::Url::parse(host).ok()?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let joined = base.join(relative_path.trim_start_matches('/')).ok()?;
    Some(joined.to_string())
}

/// Try each mirror in order and return the first that probes with HTTP 200.
///
/// Probes never run in parallel: mirrors are ranked by preference and the
/// first success short-circuits the scan. A mirror that times out, refuses
/// the connection or answers non-200 is skipped, not reported.
///
/// The scan stops as soon as `cancel` fires: the in-flight probe is aborted
/// and no further mirror is contacted.
pub fn probe_mirrors(
    relative_path: &str,
    hosts: &[String],
    transport: &TransportOptions,
    cancel: &CancelToken,
) -> Option<ResolvedMirror> {
    for host in hosts {
        if cancel.is_cancelled() {
            tracing::debug!(relative_path, "mirror scan cancelled");
            return None;
        }
        let Some(url) = mirror_url(host, relative_path) else {
            tracing::debug!(host = %host, "skipping mirror with invalid base URL");
            continue;
        };
        match probe_cancellable(&url, transport.probe_timeout, transport, cancel) {
            Ok(ProbeOutcome::Found(meta)) => {
                tracing::debug!(url = %url, len = meta.content_length, "mirror resolved");
                return Some(ResolvedMirror {
                    url,
                    content_length: meta.content_length,
                });
            }
            Ok(ProbeOutcome::NotFound(code)) => {
                tracing::debug!(url = %url, code, "mirror does not serve resource");
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "mirror probe failed");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_url_joins_with_and_without_slashes() {
        assert_eq!(
            mirror_url("https://m1.example/libs", "a/b.jar").as_deref(),
            Some("https://m1.example/libs/a/b.jar")
        );
        assert_eq!(
            mirror_url("https://m1.example/libs/", "/a/b.jar").as_deref(),
            Some("https://m1.example/libs/a/b.jar")
        );
        assert_eq!(
            mirror_url("http://127.0.0.1:8080", "x.bin").as_deref(),
            Some("http://127.0.0.1:8080/x.bin")
        );
    }

    #[test]
    fn mirror_url_rejects_relative_host() {
        assert_eq!(mirror_url("not a url", "x"), None);
    }

    #[test]
    fn empty_mirror_list_resolves_nothing() {
        assert_eq!(
            probe_mirrors("x", &[], &TransportOptions::default(), &CancelToken::new()),
            None
        );
    }

    #[test]
    fn cancelled_scan_contacts_nobody() {
        let cancel = CancelToken::new();
        cancel.cancel();
        // Port 9 (discard) is never reached: the token is checked first.
        let hosts = vec!["http://127.0.0.1:9/".to_string()];
        assert_eq!(
            probe_mirrors("x", &hosts, &TransportOptions::default(), &cancel),
            None
        );
    }
}
