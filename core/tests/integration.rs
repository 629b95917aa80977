//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises `HttpClient` over
//! real HTTP with the default `ureq` transport. A recording sink stands in for
//! the log so outcomes can be asserted on.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use axum::http::StatusCode;
use mock_server::MockOptions;
use release_core::{
    ClientError, ClientEvent, Endpoint, HttpClient, JsonPayload, RecordingSink, Timeouts,
    TransportError, UreqTransport,
};
use serde_json::json;

/// Serve the mock app on `127.0.0.1:0` from a background runtime.
fn start_server(options: MockOptions) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, options).await
        })
        .unwrap();
    });

    addr
}

/// Accept one connection, read the request head, then write `reply` and
/// keep the socket open for `linger`. Write errors are ignored: the client
/// may hang up without reading the body.
fn serve_raw_once(reply: Vec<u8>, linger: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            match stream.read(&mut byte) {
                Ok(1) => head.push(byte[0]),
                _ => return,
            }
        }
        let _ = stream.write_all(&reply);
        let _ = stream.flush();
        std::thread::sleep(linger);
    });

    addr
}

fn ok_with_body(body: &[u8]) -> Vec<u8> {
    let mut reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    reply.extend_from_slice(body);
    reply
}

fn client_for(addr: SocketAddr) -> HttpClient<UreqTransport, RecordingSink> {
    let endpoint = Endpoint::http(&addr.ip().to_string(), addr.port()).unwrap();
    HttpClient::with_parts(endpoint, UreqTransport::default(), RecordingSink::new())
}

fn payload(value: serde_json::Value) -> JsonPayload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("payload must be an object"),
    }
}

#[test]
fn probe_healthy_server() {
    let addr = start_server(MockOptions::default());
    let client = client_for(addr);

    assert!(client.is_connected());
    assert_eq!(
        client.sink().events(),
        vec![ClientEvent::Connected {
            url: format!("http://{addr}/"),
            status: 200,
        }]
    );
}

#[test]
fn probe_counts_client_errors_as_reachable() {
    let addr = start_server(MockOptions {
        root_status: StatusCode::NOT_FOUND,
    });
    assert!(client_for(addr).is_connected());
}

#[test]
fn probe_rejects_server_errors() {
    let addr = start_server(MockOptions {
        root_status: StatusCode::SERVICE_UNAVAILABLE,
    });
    let client = client_for(addr);

    assert!(!client.is_connected());
    assert!(matches!(
        client.sink().events()[0],
        ClientEvent::ProbeRejected { status: 503, .. }
    ));
}

#[test]
fn probe_refused_connection_is_false() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = Endpoint::http("127.0.0.1", port).unwrap();
    let transport = UreqTransport::new(Timeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(500),
    });
    let client = HttpClient::with_parts(endpoint, transport, RecordingSink::new());

    assert!(!client.is_connected());
    assert!(matches!(
        client.sink().events()[0],
        ClientEvent::ProbeFailed { .. }
    ));
}

#[test]
fn binary_body_does_not_hide_a_200() {
    let addr = serve_raw_once(ok_with_body(&[0xff, 0xfe, 0x00, 0x81]), Duration::from_millis(200));
    let client = client_for(addr);

    assert!(client.is_connected());
    assert_eq!(
        client.sink().events(),
        vec![ClientEvent::Connected {
            url: format!("http://{addr}/"),
            status: 200,
        }]
    );
}

#[test]
fn oversized_body_does_not_hide_a_200() {
    let body = vec![b'x'; 11 * 1024 * 1024];
    let addr = serve_raw_once(ok_with_body(&body), Duration::from_millis(200));
    let client = client_for(addr);

    assert!(client.is_connected());
    assert!(matches!(
        client.sink().events()[0],
        ClientEvent::Connected { status: 200, .. }
    ));
}

#[test]
fn stalled_body_does_not_hide_a_200() {
    // Promises a body that never arrives.
    let reply = b"HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n".to_vec();
    let addr = serve_raw_once(reply, Duration::from_millis(1500));
    let endpoint = Endpoint::http("127.0.0.1", addr.port()).unwrap();
    let transport = UreqTransport::new(Timeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(300),
    });
    let client = HttpClient::with_parts(endpoint, transport, RecordingSink::new());

    assert!(client.is_connected());
}

#[test]
fn silent_server_times_out_as_not_connected() {
    // Accepts and reads the request but never answers.
    let addr = serve_raw_once(Vec::new(), Duration::from_millis(1500));
    let endpoint = Endpoint::http("127.0.0.1", addr.port()).unwrap();
    let transport = UreqTransport::new(Timeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(300),
    });
    let client = HttpClient::with_parts(endpoint, transport, RecordingSink::new());

    assert!(!client.is_connected());
    match &client.sink().events()[0] {
        ClientEvent::ProbeFailed { url, error } => {
            assert_eq!(url, &format!("http://{addr}/"));
            assert!(matches!(error, TransportError::Timeout(_)), "got {error:?}");
        }
        other => panic!("expected a failed connectivity check, got {other:?}"),
    }
}

#[test]
fn post_new_versions_query() {
    let addr = start_server(MockOptions::default());
    let client = client_for(addr);

    let query = payload(json!({
        "groupId": "org.jgrapht",
        "artifactId": "jgrapht-core",
        "version": "1.5.0",
        "addedValues": ["CVE", "FRESHNESS", "POPULARITY_1_YEAR"],
    }));
    let reply = client
        .post("/release/newVersions", &query)
        .unwrap()
        .expect("200 with a JSON object");

    assert_eq!(reply["groupId"], "org.jgrapht");
    assert_eq!(reply["current"], "1.5.0");
    assert_eq!(reply["newerVersions"], json!(["1.5.1", "1.5.2", "1.6.0"]));

    let url = format!("http://{addr}/release/newVersions");
    assert_eq!(
        client.sink().events(),
        vec![
            ClientEvent::PostSent { url: url.clone() },
            ClientEvent::PostStatus { url, status: 200 },
        ]
    );
}

#[test]
fn post_echo_round_trips_structure() {
    let addr = start_server(MockOptions::default());
    let client = client_for(addr);

    let body = payload(json!({
        "zeta": "last-first",
        "nested": { "list": [1, -2, 3.25, true, null, "s"], "empty": {} },
        "flag": false,
    }));
    let echoed = client.post("/echo", &body).unwrap().unwrap();

    assert_eq!(echoed, body);
    let keys: Vec<&String> = echoed.keys().collect();
    assert_eq!(keys, ["zeta", "nested", "flag"]);
}

#[test]
fn post_non_200_is_absent() {
    let addr = start_server(MockOptions::default());
    let client = client_for(addr);

    for target in ["/status/404", "/status/500", "/status/201", "/nowhere"] {
        let result = client.post(target, &JsonPayload::new()).unwrap();
        assert!(result.is_none(), "{target} should yield no result");
    }
}

#[test]
fn post_malformed_200_is_an_error() {
    let addr = start_server(MockOptions::default());
    let client = client_for(addr);

    let err = client.post("/not-json", &JsonPayload::new()).unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));

    let err = client.post("/array", &JsonPayload::new()).unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[test]
fn post_to_unreachable_server_is_absent() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = Endpoint::http("127.0.0.1", port).unwrap();
    let client = HttpClient::with_parts(endpoint, UreqTransport::default(), RecordingSink::new());

    let result = client.post("/release/newVersions", &JsonPayload::new()).unwrap();
    assert!(result.is_none());
    assert!(matches!(
        client.sink().events()[1],
        ClientEvent::PostFailed { .. }
    ));
}
