//! `HttpSource` against a throwaway local listener.
//!
//! Each test binds its own port on 127.0.0.1 and serves exactly one canned
//! response, so nothing leaves the machine.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use giftsync_core::{Attribute, SourceConfig};
use giftsync_source::{ErrorKind, GiftSource, HttpSource, SourceEndpoints};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serve one response and hand back the raw request bytes.
fn serve_capturing(status_line: &'static str, body: Vec<u8>) -> (String, mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let mut response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let _ = tx.send(buf[..n].to_vec());
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
    });
    (format!("http://{addr}"), rx)
}

fn serve_once(status_line: &'static str, body: &'static str) -> String {
    serve_capturing(status_line, body.as_bytes().to_vec()).0
}

/// Accept one connection and never answer.
fn serve_stalled(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(hold);
            drop(stream);
        }
    });
    format!("http://{addr}")
}

fn source(primary_base: String, secondary_base: String) -> HttpSource {
    HttpSource::new(
        SourceEndpoints {
            primary_base,
            secondary_base,
        },
        Duration::from_secs(5),
        "giftsync-test",
    )
}

// Nothing listens on port 1; connecting is refused immediately.
const REFUSED: &str = "http://127.0.0.1:1";

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

#[test]
fn primary_success_parses_json() {
    let base = serve_once(
        "200 OK",
        r#"{"name":"Durov's Cap #3","attributes":[{"trait_type":"Model","value":"Cap"}]}"#,
    );
    let data = source(base, REFUSED.to_string())
        .fetch_primary("DurovsCap", 3)
        .expect("fetch");
    assert_eq!(data.name, "Durov's Cap #3");
    assert_eq!(data.attributes, vec![Attribute::new("Model", "Cap", 0.0)]);
}

#[test]
fn primary_non_2xx_is_network_error() {
    let base = serve_once("404 Not Found", "missing");
    let err = source(base, REFUSED.to_string())
        .fetch_primary("DurovsCap", 3)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn primary_malformed_body_is_decode_error() {
    let base = serve_once("200 OK", "<html>maintenance</html>");
    let err = source(base, REFUSED.to_string())
        .fetch_primary("DurovsCap", 3)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn primary_invalid_utf8_body_is_decode_error() {
    let (base, _) = serve_capturing("200 OK", vec![0xff, 0xfe, 0x7b]);
    let err = source(base, REFUSED.to_string())
        .fetch_primary("DurovsCap", 3)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn primary_stalled_server_times_out_as_network_error() {
    let base = serve_stalled(Duration::from_secs(10));
    let source = HttpSource::new(
        SourceEndpoints {
            primary_base: base,
            secondary_base: REFUSED.to_string(),
        },
        Duration::from_secs(1),
        "giftsync-test",
    );
    let started = Instant::now();
    let err = source.fetch_primary("DurovsCap", 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "timeout not honoured: {:?}",
        started.elapsed()
    );
}

#[test]
fn configured_user_agent_and_lowercase_path_are_sent() {
    let (base, requests) = serve_capturing("200 OK", br#"{"name":"Cap"}"#.to_vec());
    let config = SourceConfig {
        primary_base: base,
        secondary_base: REFUSED.to_string(),
        ..SourceConfig::default()
    };
    HttpSource::from_config(&config)
        .fetch_primary("DurovsCap", 3)
        .expect("fetch");

    let request = String::from_utf8(requests.recv_timeout(Duration::from_secs(5)).expect("request"))
        .expect("utf8 request");
    assert!(request.starts_with("GET /gift/durovscap-3 "), "{request}");
    let user_agent = request
        .lines()
        .find_map(|line| line.strip_prefix("User-Agent: ").or_else(|| line.strip_prefix("user-agent: ")))
        .expect("user agent header");
    assert_eq!(user_agent, SourceConfig::default().user_agent);
    assert!(user_agent.starts_with("Mozilla/5.0"));
}

#[test]
fn primary_connection_refused_is_network_error() {
    let err = source(REFUSED.to_string(), REFUSED.to_string())
        .fetch_primary("DurovsCap", 3)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

// ---------------------------------------------------------------------------
// Secondary
// ---------------------------------------------------------------------------

#[test]
fn secondary_success_parses_table() {
    let base = serve_once(
        "200 OK",
        r#"<div class="tgme_gift_table_wrap"><table class="tgme_gift_table"><tbody>
             <tr><th>Owner</th><td><img src="https://cdn/o.png"><span>Dave</span></td></tr>
             <tr><th>Model</th><td>Cap <mark>0.8%</mark></td></tr>
           </tbody></table></div>"#,
    );
    let data = source(REFUSED.to_string(), base).fetch_secondary("DurovsCap", 3);
    assert_eq!(data.owner.as_deref(), Some("Dave"));
    assert_eq!(data.attributes, vec![Attribute::new("Model", "Cap", 0.8)]);
}

#[test]
fn secondary_transport_failure_is_empty() {
    let data = source(REFUSED.to_string(), REFUSED.to_string()).fetch_secondary("DurovsCap", 3);
    assert!(data.is_empty());
}
