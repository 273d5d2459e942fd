//! Shared helpers for integration tests.

use std::sync::Once;

static MAY_INIT: Once = Once::new();

/// Configure the coroutine runtime once per test binary.
pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send raw request bytes and return the whole response as a string.
    /// The server closes the connection after one reply, so reading to end
    /// of stream captures exactly one response.
    pub fn send_request(addr: SocketAddr, request: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).expect("connect to test server");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set client read timeout");
        stream.write_all(request).expect("write request");
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .expect("read response to end of stream");
        response
    }
}
