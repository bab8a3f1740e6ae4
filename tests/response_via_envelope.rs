//! A received message's envelope can reply on its own, without the caller
//! needing to know the server's send method or look up the sender's
//! address again; and a reply through an envelope whose server has since
//! been dropped fails cleanly instead of panicking.

use std::time::Duration;

use linkwire::error::SendError;
use linkwire::{Client, RawMessage, Server};

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[test]
fn envelope_send_response_reaches_the_original_sender() {
    let server_name = unique_name("linkwire-envelope-ok");
    let server = Server::unix_queued(&server_name).unwrap();
    server.start();

    let client = Client::unix(&server_name).unwrap();
    client.send(&RawMessage::from_slice(5, b"hi")).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    let envelope = server.receive(500, &[], None).unwrap();
    envelope
        .send_response(&RawMessage::from_slice(6, b"there"))
        .unwrap();

    let reply = client.receive(500, &[6]).unwrap();
    assert_eq!(reply.message().payload(), b"there");

    server.stop();
}

#[test]
fn envelope_send_response_fails_once_server_is_dropped() {
    let server_name = unique_name("linkwire-envelope-gone");
    let server = Server::unix_queued(&server_name).unwrap();
    server.start();

    let client = Client::unix(&server_name).unwrap();
    client.send(&RawMessage::new(1)).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let envelope = server.receive(500, &[], None).unwrap();
    drop(server);

    let result = envelope.send_response(&RawMessage::new(2));
    assert!(matches!(result, Err(SendError::ServerGone)));
}
