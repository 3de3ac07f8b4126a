use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};

use readywatch::net::{TcpListener, TcpStream};
use readywatch::{Error, Interest, Selector};

fn connected_pair() -> (TcpListener, TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    // give the kernel a moment to complete the loopback handshake
    let (server, _) = loop {
        match listener.accept() {
            Ok(pair) => break pair,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => panic!("accept failed: {e}"),
        }
    };
    (listener, client, server)
}

#[test]
fn register_reports_registered_and_empty() {
    let selector: Selector<&'static str> = Selector::new().unwrap();
    assert!(selector.empty());

    let (_listener, client, _server) = connected_pair();
    let fd = client.as_raw_fd();

    let monitor = selector.register(fd, Interest::READ, "client").unwrap();
    assert!(selector.registered(fd));
    assert!(!selector.empty());
    assert_eq!(*monitor.user_data(), "client");
    assert_eq!(monitor.endpoint(), fd);
    assert_eq!(monitor.interests(), Interest::READ);
}

#[test]
fn set_interests_is_observed_and_idempotent() {
    let selector: Selector<()> = Selector::new().unwrap();
    let (_listener, client, _server) = connected_pair();
    let fd = client.as_raw_fd();

    let monitor = selector.register(fd, Interest::NIL, ()).unwrap();
    monitor.set_interests(Interest::READ_WRITE).unwrap();
    assert_eq!(monitor.interests(), Interest::READ_WRITE);

    monitor.add_interest(Interest::READ).unwrap();
    monitor.add_interest(Interest::READ).unwrap();
    assert_eq!(monitor.interests(), Interest::READ_WRITE);

    monitor.remove_interest(Interest::WRITE).unwrap();
    assert_eq!(monitor.interests(), Interest::READ);
}

#[test]
fn close_rejects_further_mutation() {
    let selector: Selector<()> = Selector::new().unwrap();
    let (_listener, client, _server) = connected_pair();
    let fd = client.as_raw_fd();

    let monitor = selector.register(fd, Interest::READ, ()).unwrap();
    monitor.close(true).unwrap();

    assert!(monitor.closed());
    assert!(monitor.set_interests(Interest::WRITE).is_err());
    assert!(monitor.close(true).is_err());
    assert!(!selector.registered(fd));
}

#[test]
fn writable_server_reports_ready_promptly() {
    let selector: Selector<()> = Selector::new().unwrap();
    let (_listener, _client, server) = connected_pair();
    let fd = server.as_raw_fd();

    selector.register(fd, Interest::WRITE, ()).unwrap();

    let mut ready = Vec::new();
    let n = selector
        .select(&mut ready, 16, Some(Duration::from_secs(2)))
        .unwrap();
    assert_eq!(n, 1);
    assert!(ready[0].writable());
}

#[test]
fn empty_arm_set_zero_timeout_returns_immediately() {
    let selector: Selector<()> = Selector::new().unwrap();
    let mut ready = Vec::new();

    let started = Instant::now();
    let n = selector
        .select(&mut ready, 16, Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 0);
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn empty_arm_set_blocks_for_roughly_the_timeout() {
    let selector: Selector<()> = Selector::new().unwrap();
    let mut ready = Vec::new();

    let timeout = Duration::from_millis(150);
    let started = Instant::now();
    let n = selector.select(&mut ready, 16, Some(timeout)).unwrap();
    assert_eq!(n, 0);
    assert!(started.elapsed() >= timeout);
}

#[test]
fn interest_mutation_changes_what_select_reports() {
    let selector: Selector<()> = Selector::new().unwrap();
    let (_listener, _client, server) = connected_pair();
    let fd = server.as_raw_fd();

    let monitor = selector.register(fd, Interest::READ, ()).unwrap();

    let mut ready = Vec::new();
    let n = selector
        .select(&mut ready, 16, Some(Duration::from_millis(100)))
        .unwrap();
    assert_eq!(n, 0);

    monitor.add_interest(Interest::WRITE).unwrap();

    let n = selector
        .select(&mut ready, 16, Some(Duration::from_secs(2)))
        .unwrap();
    assert_eq!(n, 1);
    assert!(ready[0].writable());
    assert!(!ready[0].readable());
}

#[test]
fn close_rejects_register_and_select_returns_nothing() {
    let selector: Selector<()> = Selector::new().unwrap();
    let (_listener, client, server) = connected_pair();
    selector.register(client.as_raw_fd(), Interest::READ, ()).unwrap();

    selector.close().unwrap();
    assert!(selector.closed());

    let err = selector.register(server.as_raw_fd(), Interest::READ, ()).unwrap_err();
    assert!(matches!(err, Error::SelectorClosed));

    let mut ready = Vec::new();
    let err = selector.select(&mut ready, 16, Some(Duration::ZERO)).unwrap_err();
    assert!(matches!(err, Error::SelectorClosed));

    // the prior registration is untouched by close(): empty() still reports
    // the endpoint as tracked.
    assert!(!selector.empty());
}

#[test]
fn many_registrations_survive_table_growth() {
    let selector: Selector<usize> = Selector::new().unwrap();
    let mut sockets = Vec::new();
    for i in 0..40 {
        let (_listener, client, server) = connected_pair();
        selector.register(client.as_raw_fd(), Interest::READ, i).unwrap();
        sockets.push((client, server));
    }
    assert!(!selector.empty());
    for (client, _server) in &sockets {
        assert!(selector.registered(client.as_raw_fd()));
    }
}
