use super::*;

use tokio::io::AsyncReadExt;

fn duplex_link(stop: Arc<AtomicBool>) -> (InjectorLink, tokio::io::DuplexStream) {
    let (ours, theirs) = tokio::io::duplex(4096);
    (InjectorLink::start(ours, stop), theirs)
}

async fn read_available(port: &mut tokio::io::DuplexStream) -> String {
    let mut buf = vec![0u8; 4096];
    let n = port.read(&mut buf).await.unwrap();
    String::from_utf8(buf[..n].to_vec()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_commands_written_in_enqueue_order_with_crlf() {
    let (link, mut port) = duplex_link(Arc::new(AtomicBool::new(false)));

    link.send(Command::Move { dx: 5, dy: -2 }).await.unwrap();
    link.send(Command::Click).await.unwrap();
    link.send(Command::Scroll { units: 6 }).await.unwrap();

    let mut written = String::new();
    while !written.contains("SCROLL") {
        written.push_str(&read_available(&mut port).await);
    }
    assert_eq!(written, "MOVE,5,-2\r\nCLICK\r\nSCROLL,6\r\n");
}

#[tokio::test(start_paused = true)]
async fn test_enter_key_is_refused() {
    let (link, _port) = duplex_link(Arc::new(AtomicBool::new(false)));

    let err = link.send(Command::key("Enter")).await.unwrap_err();
    assert!(matches!(err, LinkError::Blocked(_)));

    // Other named keys pass.
    link.send(Command::key("Backspace")).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_emergency_stop_short_circuits_send() {
    let stop = Arc::new(AtomicBool::new(false));
    let (link, mut port) = duplex_link(stop.clone());

    link.send(Command::Click).await.unwrap();
    let mut written = read_available(&mut port).await;
    while !written.contains("CLICK") {
        written.push_str(&read_available(&mut port).await);
    }

    stop.store(true, Ordering::SeqCst);
    let err = link.send(Command::Click).await.unwrap_err();
    assert!(matches!(err, LinkError::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_queue_drains_without_writing_after_stop() {
    let stop = Arc::new(AtomicBool::new(false));
    let (link, mut port) = duplex_link(stop.clone());

    // Enqueue directly, then raise the flag before the consumer runs the
    // second command; it must complete without hitting the wire.
    link.send(Command::Move { dx: 1, dy: 1 }).await.unwrap();
    stop.store(true, Ordering::SeqCst);

    let (done, done_rx) = oneshot::channel();
    link.tx
        .send(Queued {
            command: Command::Click,
            done,
        })
        .unwrap();
    done_rx.await.unwrap();

    let written = read_available(&mut port).await;
    assert_eq!(written, "MOVE,1,1\r\n");
}
