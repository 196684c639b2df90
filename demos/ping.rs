//! The smallest protocol consumer: a handler that answers every request
//! with `Pong!`, wired up through the registry the way an embedding host
//! would at startup.

use gatelink::{AppBody, BridgeConfig, Environ, Gateway, HandlerError, HostRequest, Registry, StartResponse};

/// Answers any request with a fixed plain-text body.
fn ping_app(_environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
    let output = "Pong!";

    start.start(
        "200 OK",
        [
            ("Content-Type", "text/plain".to_owned()),
            ("Content-Length", output.len().to_string()),
        ],
    );
    Ok(AppBody::new(output))
}

fn main() {
    // At process start the host registers its handlers and resolves the
    // configured dotted path; a failure here is fatal to startup.
    let mut registry = Registry::new();
    registry.register("hello", "ping_app", ping_app);

    let config = BridgeConfig {
        handler: "hello.ping_app".to_owned(),
    };
    let gateway = Gateway::from_config(&config, &registry).expect("handler must resolve");

    // Per request, the host hands over its raw fields and transmits the
    // returned triple.
    let response = gateway.on_request(
        HostRequest::new()
            .var("REQUEST_METHOD", "GET")
            .var("PATH_INFO", "/ping"),
    );

    let (status, headers, body) = response.into_parts();
    println!("status: {}", status);
    for (name, value) in headers {
        println!("{}: {}", name, value);
    }
    println!();
    println!("{}", String::from_utf8_lossy(&body));
}
