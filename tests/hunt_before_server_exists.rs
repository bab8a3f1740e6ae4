//! A client that starts hunting before its target server exists keeps
//! retrying until the server comes up and starts answering pings, rather
//! than failing on the first missed attempt.

use std::thread;
use std::time::Duration;

use linkwire::{Client, Server};

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[test]
fn hunt_succeeds_once_the_server_starts_late() {
    let server_name = unique_name("linkwire-hunt-late");
    let client = Client::unix(&server_name).unwrap();

    let server_name_for_thread = server_name.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        let server = Server::unix_queued(&server_name_for_thread).unwrap();
        server.start();
        thread::sleep(Duration::from_millis(500));
        server.stop();
    });

    client.connect(3_000).expect("hunt should eventually succeed");
    handle.join().unwrap();
}

#[test]
fn hunt_times_out_if_the_server_never_starts() {
    let client = Client::unix(unique_name("linkwire-hunt-never")).unwrap();
    let result = client.connect(150);
    assert!(result.is_err());
}
