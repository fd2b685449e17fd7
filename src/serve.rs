//! A blocking static file server for previewing a rendered site.

use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Serves the files under `root` on `addr` until the process is stopped.
pub fn serve(root: &Path, addr: &str) -> Result<()> {
    let server = Server::http(addr).map_err(|e| anyhow!("binding {}: {}", addr, e))?;
    info!("serving {} on http://{}/", root.display(), addr);
    for request in server.incoming_requests() {
        if let Err(e) = respond(root, request) {
            warn!("responding: {}", e);
        }
    }
    Ok(())
}

fn respond(root: &Path, request: Request) -> std::io::Result<()> {
    let file = resolve(root, request.url()).and_then(|path| {
        File::open(&path).ok().map(|file| (path, file))
    });
    match file {
        Some((path, file)) => {
            debug!("{} -> {}", request.url(), path.display());
            let mut response = Response::from_file(file);
            if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type(&path)) {
                response.add_header(header);
            }
            request.respond(response)
        }
        None => {
            debug!("{} -> 404", request.url());
            request.respond(Response::from_string("404 Not Found").with_status_code(404))
        }
    }
}

/// Maps a request URL onto a file under `root`. The URL is percent-decoded
/// first. Directories resolve to their `index.html`; URLs with `..` segments
/// or that don't decode to UTF-8 don't resolve.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url).ok()?;
    let path = decoded.split(|c| c == '?' || c == '#').next().unwrap_or("");
    let mut resolved = root.to_owned();
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            return None;
        }
        resolved.push(segment);
    }
    if resolved.is_dir() {
        resolved.push("index.html");
    }
    if resolved.is_file() {
        Some(resolved)
    } else {
        None
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("txt") | Some("md") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
