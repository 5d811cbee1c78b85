use crate::pagination::PageWindow;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveKey {
    pub source: String,
    pub storage: String,
}

pub fn effective_key(declared: &str, window: PageWindow) -> EffectiveKey {
    let source = if window.is_default() {
        declared.to_string()
    } else {
        format!("{declared}:limit={}:page={}", window.limit, window.page)
    };
    EffectiveKey {
        storage: sha256_hex(source.as_bytes()),
        source,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    const HEX: &[u8; 16] = b"0123456789abcdef";
    for byte in digest.iter().copied() {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
