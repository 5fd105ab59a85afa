use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stops and joins the accept loop when dropped.
pub struct ServerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a local HTTP server that answers every request with 200 OK.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server() -> Result<(String, ServerHandle), String> {
    let listener = bind_local()?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let stop = Arc::new(AtomicBool::new(false));
    let accept_stop = Arc::clone(&stop);

    let thread = thread::spawn(move || {
        while !accept_stop.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || answer_ok(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(_) => return,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            stop,
            thread: Some(thread),
        },
    ))
}

/// Reserve a port with nothing listening on it.
///
/// # Errors
///
/// Returns an error if no local port can be probed.
pub fn unused_port() -> Result<u16, String> {
    let probe = bind_local()?;
    let port = probe
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?
        .port();
    drop(probe);
    Ok(port)
}

fn bind_local() -> Result<TcpListener, String> {
    TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))
}

fn answer_ok(mut stream: TcpStream) {
    let mut request = [0u8; 1024];
    if stream.read(&mut request).is_err() {
        return;
    }
    let sent = stream
        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK")
        .and_then(|()| stream.flush());
    if sent.is_ok() {
        drop(stream.shutdown(Shutdown::Both));
    }
}

/// Run the `volley` binary with the given arguments and capture its output.
///
/// # Errors
///
/// Returns an error if the binary cannot be located or executed.
pub fn run_volley(args: &[&str]) -> Result<Output, String> {
    let bin = match option_env!("CARGO_BIN_EXE_volley") {
        Some(path) => path,
        None => return Err("CARGO_BIN_EXE_volley missing at compile time.".to_owned()),
    };
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .map_err(|err| format!("run volley failed: {}", err))
}
