//! Integration tests for gateway resolution and verified downloads.

mod common;

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use common::{dead_gateway, local_options, redirect, TestGateway};
use pdfannotate::fetch::GatewayResolver;
use pdfannotate::{ChecksummingFetcher, DigestAlgorithm, Error, FetchRequest, Fetched};
use reqwest::Url;
use tiny_http::{Method, Response};

const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
const HELLO_MD5: &str = "5EB63BBBE01EEED093CB22BB8F5ACDC3";
const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

fn resolver_for(templates: &[String]) -> GatewayResolver {
    let fetcher = ChecksummingFetcher::new(local_options(templates.iter().cloned())).unwrap();
    fetcher.resolver().unwrap()
}

#[test]
fn test_resolve_falls_back_to_second_gateway() {
    let missing = TestGateway::failing(404);
    let present = TestGateway::serving(b"hello world".to_vec());

    let resolver = resolver_for(&[missing.template(), present.template()]);
    let url = resolver.resolve(CID, None).unwrap();

    assert_eq!(url.as_str(), format!("{}/ipfs/{}/", present.base, CID));
    assert_eq!(missing.hits(), 1);
    assert_eq!(present.requests(), vec![format!("HEAD /ipfs/{}/", CID)]);
}

#[test]
fn test_resolve_stops_at_first_success() {
    let first = TestGateway::serving(Vec::new());
    let second = TestGateway::serving(Vec::new());

    let resolver = resolver_for(&[first.template(), second.template()]);
    let url = resolver.resolve(CID, Some("book.pdf")).unwrap();

    assert!(url.as_str().starts_with(&first.base));
    assert!(url.path().ends_with("/book.pdf"));
    assert_eq!(first.hits(), 1);
    assert_eq!(second.hits(), 0);
}

#[test]
fn test_resolve_skips_unreachable_gateway() {
    let present = TestGateway::serving(Vec::new());

    let resolver = resolver_for(&[dead_gateway(), present.template()]);
    let url = resolver.resolve(CID, None).unwrap();

    assert!(url.as_str().starts_with(&present.base));
}

#[test]
fn test_resolve_reports_every_failure_in_order() {
    let not_found = TestGateway::failing(404);
    let unavailable = TestGateway::failing(503);
    let dead = dead_gateway();

    let resolver = resolver_for(&[not_found.template(), dead.clone(), unavailable.template()]);
    let err = resolver.resolve(CID, None).unwrap_err();

    let Error::GatewayExhausted(failures) = err else {
        panic!("expected GatewayExhausted, got {err:?}");
    };
    assert_eq!(failures.len(), 3);
    assert!(failures[0].url.starts_with(&not_found.base));
    assert_eq!(failures[0].reason, "status 404");
    assert_eq!(failures[1].url, dead.replace("{cid}", CID));
    assert!(failures[2].url.starts_with(&unavailable.base));
    assert_eq!(failures[2].reason, "status 503");
}

#[test]
fn test_resolve_requires_exactly_200() {
    let no_content = TestGateway::failing(204);

    let resolver = resolver_for(&[no_content.template()]);
    let err = resolver.resolve(CID, None).unwrap_err();

    assert!(matches!(err, Error::GatewayExhausted(ref f) if f[0].reason == "status 204"));
}

#[test]
fn test_resolve_returns_final_url_after_redirect() {
    let target = TestGateway::serving(Vec::new());
    let location = format!("{}/content/{}", target.base, CID);
    let redirecting = TestGateway::start(move |_, _| redirect(&location));

    let resolver = resolver_for(&[redirecting.template()]);
    let url = resolver.resolve(CID, None).unwrap();

    assert_eq!(url.as_str(), format!("{}/content/{}", target.base, CID));
    assert_eq!(redirecting.hits(), 1);
    assert_eq!(target.hits(), 1);
}

#[test]
fn test_fetch_to_memory_verifies_and_rewinds() {
    let gateway = TestGateway::serving(b"hello world".to_vec());
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    // Expected digest comparison ignores case
    let cursor = fetcher
        .fetch_to_memory(url, Some(&HELLO_MD5.to_lowercase()))
        .unwrap();

    assert_eq!(cursor.position(), 0);
    assert_eq!(cursor.into_inner(), b"hello world");
}

#[test]
fn test_fetch_checksum_mismatch_names_both_digests() {
    let gateway = TestGateway::serving(b"hello world".to_vec());
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let request = FetchRequest::to_memory(url).with_digest("00112233445566778899aabbccddeeff");
    let err = fetcher.fetch(&request).unwrap_err();

    match &err {
        Error::Checksum {
            algorithm,
            computed,
            expected,
        } => {
            assert_eq!(*algorithm, DigestAlgorithm::Md5);
            assert_eq!(computed, HELLO_MD5);
            assert_eq!(expected, "00112233445566778899aabbccddeeff");
        }
        other => panic!("expected checksum error, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains(HELLO_MD5));
    assert!(message.contains("00112233445566778899aabbccddeeff"));
}

#[test]
fn test_fetch_to_file_mismatch_leaves_file() {
    let gateway = TestGateway::serving(b"hello world".to_vec());
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    let request = FetchRequest::to_file(url, &path).with_digest("ffff");

    assert!(matches!(fetcher.fetch(&request), Err(Error::Checksum { .. })));
    assert_eq!(fs::read(&path).unwrap(), b"hello world");
}

#[test]
fn test_fetch_to_file_verifies_digest() {
    let gateway = TestGateway::serving(b"hello world".to_vec());
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    let request = FetchRequest::to_file(url, &path).with_digest(HELLO_MD5.to_lowercase());
    let fetched = fetcher.fetch(&request).unwrap();

    assert!(matches!(fetched, Fetched::File(ref p) if p == &path));
    let written = fs::read(&path).unwrap();
    assert_eq!(DigestAlgorithm::Md5.digest_hex(&written), HELLO_MD5);
}

#[test]
fn test_fetch_to_file_without_digest() {
    let body: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    let gateway = TestGateway::serving(body.clone());
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    let fetched = fetcher.fetch(&FetchRequest::to_file(url, &path)).unwrap();

    assert!(matches!(fetched, Fetched::File(ref p) if p == &path));
    assert_eq!(fs::read(&path).unwrap(), body);
}

#[test]
fn test_fetch_error_status() {
    let gateway = TestGateway::start(|method, _| match method {
        Method::Head => Response::empty(200).boxed(),
        _ => Response::empty(404).boxed(),
    });
    let fetcher = ChecksummingFetcher::new(local_options([gateway.template()])).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let err = fetcher.fetch_to_memory(url, None).unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[test]
fn test_fetch_sha256_with_small_chunks() {
    let gateway = TestGateway::serving(b"hello world".to_vec());
    let options = local_options([gateway.template()])
        .with_digest_algorithm(DigestAlgorithm::Sha256)
        .with_chunk_size(3);
    let fetcher = ChecksummingFetcher::new(options).unwrap();
    let url = fetcher.resolver().unwrap().resolve(CID, None).unwrap();

    let cursor = fetcher.fetch_to_memory(url, Some(HELLO_SHA256)).unwrap();
    assert_eq!(cursor.get_ref().as_slice(), b"hello world");
}

#[test]
fn test_fetch_to_memory_ignores_oversized_content_length() {
    // Declares a petabyte, sends five bytes, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 1000000000000000\r\nConnection: close\r\n\r\nhello",
            );
        }
    });

    let fetcher = ChecksummingFetcher::new(local_options(Vec::<String>::new())).unwrap();
    let url = Url::parse(&format!("http://{addr}/ipfs/{CID}/")).unwrap();

    assert!(fetcher.fetch_to_memory(url, None).is_err());
}
