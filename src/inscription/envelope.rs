//! Inscription payload shape and the reveal-script envelope (spec §4.5, §4.8).

use bitcoin::opcodes::all::{OP_CHECKSIG, OP_ENDIF, OP_IF};
use bitcoin::opcodes::OP_FALSE;
use bitcoin::script::{Builder as ScriptBuilder, PushBytesBuf};
use bitcoin::{ScriptBuf, XOnlyPublicKey};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{LifecycleError, LifecycleResult};
use crate::identifier::{AssetIdentifier, Bindings};
use crate::resource::Resource;

/// Protocol tag pushed immediately after `OP_IF`, identifying this as an
/// ordinal inscription envelope.
const PROTOCOL_ID: &[u8] = b"ord";
const CONTENT_TYPE_TAG: u8 = 1;
const POINTER_TAG: u8 = 2;
const METADATA_TAG: u8 = 5;
const BODY_TAG: u8 = 0;

/// Largest single data push a Bitcoin script element allows; larger content
/// bodies (and, if present, metadata) are chunked across multiple pushes of
/// the same tag, which the reveal-script parser concatenates back together.
const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// The data carried by an inscription: content type, body, and the two
/// optional ord fields `build_reveal_script` encodes into the envelope under
/// their ord-convention tags (metadata at tag 5, pointer at tag 2).
#[derive(Debug, Clone)]
pub struct InscriptionEnvelope {
    pub content_type: String,
    pub content: Vec<u8>,
    pub metadata: Option<Value>,
    pub pointer: Option<u64>,
}

impl InscriptionEnvelope {
    /// Validates the preconditions in spec §4.5: non-empty content, a
    /// non-empty content type.
    pub fn validate(&self) -> LifecycleResult<()> {
        if self.content.is_empty() {
            return Err(LifecycleError::InvalidInput("inscription content must not be empty".into()));
        }
        if self.content_type.is_empty() {
            return Err(LifecycleError::InvalidInput("inscription content type must not be empty".into()));
        }
        Ok(())
    }
}

fn push(builder: ScriptBuilder, bytes: &[u8]) -> ScriptBuilder {
    let mut buf = PushBytesBuf::with_capacity(bytes.len());
    buf.extend_from_slice(bytes).expect("script pushes are bounded by MAX_SCRIPT_ELEMENT_SIZE chunks");
    builder.push_slice(buf)
}

/// Pushes `bytes` under `tag`, repeating the tag before each
/// `MAX_SCRIPT_ELEMENT_SIZE` chunk when it doesn't fit a single push. An
/// empty `bytes` pushes nothing at all, so an absent/zero field is simply
/// omitted from the script rather than encoded as an empty push.
fn push_tagged(mut builder: ScriptBuilder, tag: u8, bytes: &[u8]) -> ScriptBuilder {
    for chunk in bytes.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
        builder = builder.push_int(tag as i64);
        builder = push(builder, chunk);
    }
    builder
}

/// Minimal little-endian encoding of `pointer`, with trailing zero bytes
/// omitted (ord convention); a zero pointer encodes to no bytes at all.
fn encode_pointer(pointer: u64) -> Vec<u8> {
    let mut bytes = pointer.to_le_bytes().to_vec();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes
}

/// Builds the tapscript reveal leaf: `<internal_key> OP_CHECKSIG OP_FALSE
/// OP_IF "ord" <content-type tag><content type> [<pointer tag><pointer>]
/// [<metadata tag><metadata>...] <body tag><content chunks...> OP_ENDIF`
/// (spec §4.5, grounded in the real `ord` wallet envelope and in
/// `via_btc_client`'s `InscriptionData::build_basic_inscription_script`).
/// Metadata is carried as JSON rather than ord's native CBOR: the dependency
/// stack here has `serde_json` already and no CBOR crate, and this engine's
/// own metadata consumer (`canonicalize_asset_payload`) is JSON too.
pub fn build_reveal_script(envelope: &InscriptionEnvelope, internal_key: XOnlyPublicKey) -> ScriptBuf {
    let mut builder = ScriptBuilder::new();
    builder = push(builder, &internal_key.serialize());
    builder = builder.push_opcode(OP_CHECKSIG).push_opcode(OP_FALSE).push_opcode(OP_IF);
    builder = push(builder, PROTOCOL_ID);
    builder = builder.push_int(CONTENT_TYPE_TAG as i64);
    builder = push(builder, envelope.content_type.as_bytes());
    if let Some(pointer) = envelope.pointer {
        builder = push_tagged(builder, POINTER_TAG, &encode_pointer(pointer));
    }
    if let Some(metadata) = &envelope.metadata {
        let encoded = serde_json::to_vec(metadata).expect("serde_json::Value always serializes");
        builder = push_tagged(builder, METADATA_TAG, &encoded);
    }
    builder = builder.push_int(BODY_TAG as i64);
    for chunk in envelope.content.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
        builder = push(builder, chunk);
    }
    builder.push_opcode(OP_ENDIF).into_script()
}

/// Canonicalizes an asset's core metadata — primary identifier, resource
/// list with digests, and bindings — as deterministic, sorted-key JSON
/// (spec §4.8, resolved in SPEC_FULL.md §9.3). `serde_json`'s default `Map`
/// is `BTreeMap`-backed, so key order here is solely a function of the key
/// strings, never of insertion order.
pub fn canonicalize_asset_payload(
    primary_identifier: &AssetIdentifier,
    resources: &[Resource],
    bindings: &Bindings,
) -> LifecycleResult<Vec<u8>> {
    let mut resource_digests: BTreeMap<String, String> = BTreeMap::new();
    for r in resources {
        resource_digests.insert(r.id.clone(), r.hash.clone());
    }
    let mut binding_map: BTreeMap<&'static str, String> = BTreeMap::new();
    for (tag, id) in bindings.iter() {
        binding_map.insert(tag.as_str(), id.as_str().to_string());
    }

    let payload = serde_json::json!({
        "primaryIdentifier": primary_identifier.as_str(),
        "resources": resource_digests,
        "bindings": binding_map,
    });

    serde_json::to_vec(&payload)
        .map_err(|e| LifecycleError::InvalidInput(format!("failed to canonicalize inscription payload: {e}")))
}
