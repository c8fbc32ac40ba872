//! Shared fixtures: generated PDFs and local HTTP gateways.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lopdf::{Dictionary, Document, Object};
use pdfannotate::FetchOptions;
use tiny_http::{Header, Method, Response, ResponseBox, Server};

/// Build a minimal PDF with `pages` empty letter-size pages.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(pages as i64));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A local HTTP server standing in for an IPFS gateway.
pub struct TestGateway {
    /// `http://127.0.0.1:<port>`
    pub base: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestGateway {
    /// Start a server answering every request with `handler(method, path)`.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Method, &str) -> ResponseBox + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let thread_hits = Arc::clone(&hits);
        let thread_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                thread_hits.fetch_add(1, Ordering::SeqCst);
                thread_requests
                    .lock()
                    .unwrap()
                    .push(format!("{} {}", request.method().as_str(), request.url()));
                let response = handler(request.method(), request.url());
                let _ = request.respond(response);
            }
        });

        Self {
            base: format!("http://{addr}"),
            hits,
            requests,
        }
    }

    /// Serve `body` for GET and 200 for HEAD on every path.
    pub fn serving(body: Vec<u8>) -> Self {
        Self::start(move |method, _| match method {
            Method::Head => Response::empty(200).boxed(),
            _ => Response::from_data(body.clone()).boxed(),
        })
    }

    /// Answer every request with `status` and no body.
    pub fn failing(status: u16) -> Self {
        Self::start(move |_, _| Response::empty(status).boxed())
    }

    /// Path-style gateway template pointing at this server.
    pub fn template(&self) -> String {
        format!("{}/ipfs/{{cid}}/", self.base)
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `"<METHOD> <path>"` for every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// A redirect response to `location`.
pub fn redirect(location: &str) -> ResponseBox {
    let header = Header::from_bytes(&b"Location"[..], location.as_bytes()).unwrap();
    Response::empty(302).with_header(header).boxed()
}

/// Gateway template on a port nobody listens on.
pub fn dead_gateway() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/ipfs/{{cid}}/")
}

/// Fetch options for local gateways.
pub fn local_options<I, S>(gateways: I) -> FetchOptions
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FetchOptions::new()
        .with_gateways(gateways)
        .with_timeout(Duration::from_secs(10))
        .without_proxy()
}
