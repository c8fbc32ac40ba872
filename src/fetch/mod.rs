//! Content retrieval from IPFS HTTP gateways.
//!
//! [`GatewayResolver`] finds a gateway that has the content,
//! [`ChecksummingFetcher`] streams it down while hashing every chunk.

mod digest;
mod fetcher;
mod gateway;
mod options;

pub use digest::{copy_with_digest, DigestAlgorithm, ExpectedDigest, StreamingDigest};
pub use fetcher::{ChecksummingFetcher, Destination, FetchRequest, Fetched};
pub use gateway::{GatewayResolver, GatewayTemplate};
pub use options::{FetchOptions, CID_PLACEHOLDER, DEFAULT_CHUNK_SIZE, DEFAULT_GATEWAYS};
