//! A protocol consumer exercising the response side of the bridge: the
//! writable sink, an incrementally produced body, and the release hook.
//!
//! Request content is spooled to a temp file; the response interleaves a
//! summary line written through the sink with the spooled bytes streamed
//! back as lazy chunks. The release hook deletes the spool file once the
//! bridge finishes draining, on success or fault alike.

use std::io::{self, Write as _};

use gatelink::{AppBody, Environ, Gateway, HandlerError, HostRequest, StartResponse};

fn upload_app(environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
    if !environ.has_content() {
        start.start("200 OK", [("Content-Type", "text/plain")]);
        return Ok(AppBody::new("No file were uploaded\n"));
    }

    let mut spool = tempfile::NamedTempFile::new()?;
    let written = io::copy(environ.input(), &mut spool)?;

    let mut writer = start.start("200 OK", [("Content-Type", "text/plain")]);
    writeln!(writer, "Saved upload in file ({} bytes):", written)?;

    let replay = spool.reopen()?;
    Ok(AppBody::from_reader(replay).with_release(move || {
        // Dropping the spool unlinks the temp file.
        drop(spool);
    }))
}

fn main() {
    let gateway = Gateway::new(upload_app);

    let response = gateway.on_request(
        HostRequest::new()
            .var("REQUEST_METHOD", "POST")
            .content("-- uploaded document --\n"),
    );
    let (status, _, body) = response.into_parts();
    println!("status: {}", status);
    println!("{}", String::from_utf8_lossy(&body));

    let empty = gateway.on_request(HostRequest::new().var("REQUEST_METHOD", "POST"));
    println!("{}", String::from_utf8_lossy(&empty.into_parts().2));
}
