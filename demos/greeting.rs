//! A protocol consumer exercising the request side of the bridge: query
//! string parameters, the environment's pass-through metadata, and the
//! request input stream.

use std::io::Read as _;
use std::thread;
use std::time::Duration;

use gatelink::{AppBody, Environ, Gateway, HandlerError, HostRequest, StartResponse};

/// Greets the `subject` query parameter, dumps the environment, and echoes
/// any request content. A `sleep` parameter makes the handler block; the
/// bridge has no timeout, so a slow handler simply makes the request slow.
fn hello_world_app(environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
    let query = environ.var("QUERY_STRING").unwrap_or("").to_owned();

    let mut subject = "World".to_owned();
    let mut nap = false;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            "subject" => subject = value.into_owned(),
            "sleep" => nap = true,
            _ => {}
        }
    }
    if nap {
        thread::sleep(Duration::from_secs(5));
    }

    start.start("200 OK", [("Content-Type", "text/plain")]);

    let mut result = format!("Hello, {}!\n", subject);
    for (key, value) in environ.vars() {
        result.push_str(&format!("{}={}\n", key, value));
    }

    if environ.var("CONTENT_LENGTH").map_or(false, |len| len != "0") {
        let mut content = Vec::new();
        environ.input().read_to_end(&mut content)?;
        result.push_str(&format!("bytes read={}\n", String::from_utf8_lossy(&content)));
    }

    Ok(AppBody::new(result))
}

fn main() {
    let gateway = Gateway::new(hello_world_app);

    let response = gateway.on_request(
        HostRequest::new()
            .var("REQUEST_METHOD", "POST")
            .var("QUERY_STRING", "subject=Rustacean")
            .var("CONTENT_LENGTH", "13")
            .content("how are you?\n"),
    );

    let (status, _, body) = response.into_parts();
    println!("status: {}", status);
    println!("{}", String::from_utf8_lossy(&body));
}
