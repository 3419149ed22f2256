//! Content-addressed resource model (see spec §3, §4.1).

use sha2::{Digest, Sha256};

use crate::error::LifecycleResult;

/// Length in hex characters of a SHA-256 digest (see SPEC_FULL.md §3.1).
pub const DIGEST_HEX_LEN: usize = 64;

/// A fetcher used to retrieve a [`Resource`]'s content from its `url` during
/// verification. Fetch errors must not fail the asset (spec §4.1); callers
/// implement this as a thin wrapper over the storage/HTTP adapter they have
/// on hand.
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> LifecycleResult<Vec<u8>>;
}

/// A content-addressed attachment owned by an asset, immutable once created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Resource {
    /// Identifier unique within the owning asset.
    pub id: String,
    /// Human-readable type tag, e.g. "image", "text".
    pub resource_type: String,
    /// MIME content type, e.g. "image/png".
    pub content_type: String,
    /// Lowercase-hex SHA-256 digest of the content.
    pub hash: String,
    /// Inline content bytes, when materialized at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// URL the content can be fetched from, set once published (spec §4.8).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of [`verify_resource`], distinguishing a verified digest match
/// from a structurally-valid-but-unverifiable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Digest matched fetched or inline content.
    Verified,
    /// No content and no fetcher (or the URL fetch failed): only structural
    /// checks applied.
    StructuralOnly,
    /// A digest was present and content was available, but they disagreed.
    Mismatch,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        !matches!(self, VerificationOutcome::Mismatch)
    }
}

/// Computes the lowercase-hex SHA-256 digest of `bytes`.
pub fn compute_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

fn is_valid_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verifies `resource` per spec §4.1: a valid hex digest of the right length
/// is required; inline content (if present) must match; otherwise, if a URL
/// and fetcher are both present, the fetched bytes must match; absent both,
/// the resource is structurally valid but unverifiable.
pub async fn verify_resource(
    resource: &Resource,
    fetcher: Option<&dyn ResourceFetcher>,
) -> VerificationOutcome {
    if !is_valid_hex_digest(&resource.hash) {
        return VerificationOutcome::Mismatch;
    }

    if let Some(content) = &resource.content {
        return if compute_digest(content) == resource.hash {
            VerificationOutcome::Verified
        } else {
            VerificationOutcome::Mismatch
        };
    }

    if let (Some(url), Some(fetcher)) = (&resource.url, fetcher) {
        match fetcher.fetch(url).await {
            Ok(bytes) => {
                return if compute_digest(&bytes) == resource.hash {
                    VerificationOutcome::Verified
                } else {
                    VerificationOutcome::Mismatch
                };
            }
            Err(e) => {
                log::warn!("resource fetch for verification failed, downgrading to structural-only: {e}");
                return VerificationOutcome::StructuralOnly;
            }
        }
    }

    VerificationOutcome::StructuralOnly
}

/// Structural well-formedness check used by `createAsset` preconditions
/// (spec §4.8): a non-empty id/type/content_type and a syntactically valid
/// digest.
pub fn is_well_formed(resource: &Resource) -> bool {
    !resource.id.is_empty()
        && !resource.resource_type.is_empty()
        && !resource.content_type.is_empty()
        && is_valid_hex_digest(&resource.hash)
}
