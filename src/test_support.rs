//! Local TCP stub servers shared by the HTTP and session tests.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// Serves `status` to the first `respond_limit` requests (all of them when
/// `None`) and leaves later connections unanswered until the client gives
/// up. Threads are detached; the test process outlives them.
pub(crate) fn spawn_test_server(
    status: u16,
    respond_limit: Option<usize>,
) -> Result<String, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;

    thread::spawn(move || {
        let mut served = 0usize;
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let respond = respond_limit.map_or(true, |limit| served < limit);
                    served = served.saturating_add(1);
                    thread::spawn(move || handle_client(stream, status, respond));
                }
                Err(_) => break,
            }
        }
    });

    Ok(format!("http://{}", addr))
}

fn handle_client(mut stream: TcpStream, status: u16, respond: bool) {
    let mut buffer = [0u8; 1024];
    if stream.read(&mut buffer).is_err() {
        return;
    }
    if !respond {
        // Hold the connection open so the client runs into its timeout.
        thread::sleep(Duration::from_secs(5));
        drop(stream.shutdown(Shutdown::Both));
        return;
    }
    let response = format!(
        "HTTP/1.1 {} OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
        status
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}
