use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use readywatch::net::{TcpListener, TcpStream};
use readywatch::{Interest, Selector};

/// End-to-end echo: a client writes a message, the selector reports the
/// listener and the stream readable/writable in turn, and the bytes make it
/// all the way back.
#[test]
fn echo_round_trip_over_loopback() {
    let selector: Selector<&'static str> = Selector::new().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    selector
        .register(listener.as_raw_fd(), Interest::READ, "listener")
        .unwrap();

    let mut client = TcpStream::connect(addr).unwrap();

    let mut ready = Vec::new();
    let mut server = loop {
        selector.select(&mut ready, 16, Some(Duration::from_secs(5))).unwrap();
        if ready.iter().any(|m| *m.user_data() == "listener") {
            let (server, _) = listener.accept().unwrap();
            break server;
        }
    };
    selector
        .register(server.as_raw_fd(), Interest::READ, "server")
        .unwrap();

    client.write_all(b"ping").unwrap();

    loop {
        selector.select(&mut ready, 16, Some(Duration::from_secs(5))).unwrap();
        if ready.iter().any(|m| *m.user_data() == "server") {
            break;
        }
    }

    let mut buf = [0u8; 4];
    server.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ping");

    server.write_all(b"pong").unwrap();

    selector
        .register(client.as_raw_fd(), Interest::READ, "client")
        .unwrap();
    loop {
        selector.select(&mut ready, 16, Some(Duration::from_secs(5))).unwrap();
        if ready.iter().any(|m| *m.user_data() == "client") {
            break;
        }
    }

    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"pong");
}
