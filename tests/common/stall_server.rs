//! Minimal HTTP/1.1 server whose responses stop mid-body until released.
//!
//! Every GET gets `200 OK` with the full Content-Length, the first `stall_after`
//! bytes of the body, and then nothing until `release()` is called.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct StallServer {
    base_url: String,
    released: Arc<AtomicBool>,
}

impl StallServer {
    /// URL for `path` on this server (any path serves the same body).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Let every stalled and future response finish.
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

pub fn start(body: Vec<u8>, stall_after: usize) -> StallServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let released = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&released);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let flag = Arc::clone(&flag);
            thread::spawn(move || handle(stream, &body, stall_after, &flag));
        }
    });
    StallServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        released,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], stall_after: usize, released: &AtomicBool) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let split = stall_after.min(body.len());
    if stream.write_all(head.as_bytes()).is_err() || stream.write_all(&body[..split]).is_err() {
        return;
    }
    let _ = stream.flush();

    let deadline = Instant::now() + Duration::from_secs(30);
    while !released.load(Ordering::SeqCst) {
        if Instant::now() > deadline {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    let _ = stream.write_all(&body[split..]);
    let _ = stream.flush();
}
