//! Integration tests: HEAD probing and ordered mirror selection.

mod common;

use std::time::{Duration, Instant};

use bulkget_core::config::TransportOptions;
use bulkget_core::control::CancelToken;
use bulkget_core::probe::{self, ProbeOutcome, RemoteMeta};
use common::mock_server::{self, Route};

fn transport() -> TransportOptions {
    TransportOptions {
        probe_timeout: Duration::from_millis(300),
        ..TransportOptions::default()
    }
}

#[test]
fn first_live_mirror_wins_and_later_ones_are_not_contacted() {
    let a = mock_server::start(vec![("pkg/lib.jar", Route::Hang(Duration::from_secs(5)))]);
    let b = mock_server::start(vec![("pkg/lib.jar", Route::Body(vec![7u8; 1024]))]);
    let c = mock_server::start(vec![("pkg/lib.jar", Route::Body(vec![1u8; 10]))]);
    let hosts = vec![
        a.base().to_string(),
        b.base().to_string(),
        c.base().to_string(),
    ];

    let started = Instant::now();
    let cancel = CancelToken::new();
    let resolved =
        probe::probe_mirrors("pkg/lib.jar", &hosts, &transport(), &cancel).expect("mirror B");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(resolved.url, b.url("pkg/lib.jar"));
    assert_eq!(resolved.content_length, 1024);
    assert_eq!(a.hits("pkg/lib.jar"), 1);
    assert_eq!(b.hits("pkg/lib.jar"), 1);
    assert_eq!(c.hits("pkg/lib.jar"), 0);

    let again =
        probe::probe_mirrors("pkg/lib.jar", &hosts, &transport(), &cancel).expect("mirror B");
    assert_eq!(again, resolved);
    assert_eq!(c.hits("pkg/lib.jar"), 0);
}

#[test]
fn leading_slash_in_path_is_ignored() {
    let m = mock_server::start(vec![("assets/a.png", Route::Body(vec![0u8; 42]))]);
    let cancel = CancelToken::new();
    let resolved =
        probe::probe_mirrors("/assets/a.png", &[m.base().to_string()], &transport(), &cancel)
            .unwrap();
    assert_eq!(resolved.url, m.url("assets/a.png"));
    assert_eq!(resolved.content_length, 42);
}

#[test]
fn no_mirror_has_it() {
    let a = mock_server::start(vec![("x", Route::Status(500))]);
    let b = mock_server::start(vec![]);
    let hosts = vec![
        a.base().to_string(),
        "not a url".to_string(),
        b.base().to_string(),
    ];
    let cancel = CancelToken::new();
    assert!(probe::probe_mirrors("x", &hosts, &transport(), &cancel).is_none());
    assert!(probe::probe_mirrors("x", &[], &transport(), &cancel).is_none());
}

#[test]
fn probe_reports_status_and_length() {
    let server = mock_server::start(vec![
        ("here", Route::Body(vec![0u8; 2048])),
        ("gone", Route::Status(404)),
    ]);
    let t = transport();

    let found = probe::probe(&server.url("here"), t.probe_timeout, &t).unwrap();
    assert_eq!(
        found,
        ProbeOutcome::Found(RemoteMeta {
            content_length: 2048
        })
    );
    let missing = probe::probe(&server.url("gone"), t.probe_timeout, &t).unwrap();
    assert_eq!(missing, ProbeOutcome::NotFound(404));
}

#[test]
fn probe_timeout_is_a_classified_error() {
    let server = mock_server::start(vec![("slow", Route::Hang(Duration::from_secs(5)))]);
    let t = transport();
    let err = probe::probe(&server.url("slow"), t.probe_timeout, &t).unwrap_err();
    assert_eq!(err.kind, bulkget_core::failure::ErrorKind::Timeout);
    assert!(err.recoverable);
    assert_eq!(err.context.timeout, Some(t.probe_timeout));
}

#[test]
fn cancelling_mid_scan_aborts_the_probe_and_skips_remaining_mirrors() {
    let servers: Vec<_> = (0..3)
        .map(|_| mock_server::start(vec![("lib.jar", Route::Hang(Duration::from_secs(10)))]))
        .collect();
    let hosts: Vec<String> = servers.iter().map(|s| s.base().to_string()).collect();
    let t = TransportOptions {
        probe_timeout: Duration::from_secs(3),
        ..TransportOptions::default()
    };
    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        canceller.cancel();
    });

    let started = Instant::now();
    assert!(probe::probe_mirrors("lib.jar", &hosts, &t, &cancel).is_none());
    assert!(
        started.elapsed() < Duration::from_millis(2500),
        "scan must stop before the first probe times out"
    );
    assert_eq!(servers[0].hits("lib.jar"), 1);
    assert_eq!(servers[1].hits("lib.jar"), 0);
    assert_eq!(servers[2].hits("lib.jar"), 0);
}
