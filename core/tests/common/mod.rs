//! Shared setup for tests that talk to the live mock server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::OnceLock;

use restcheck_core::{Defaults, RequestSpec};

/// Address of the mock server, started on first use on a random port in a
/// background thread with its own runtime.
pub fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    })
}

pub fn defaults() -> Defaults {
    Defaults::default()
        .base_uri("http://127.0.0.1")
        .port(server().port())
}

pub fn given() -> RequestSpec {
    defaults().given()
}
