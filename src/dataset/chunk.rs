use anyhow::{Result, anyhow};

use crate::tokenizer::SpecialTokens;

/// Smallest window that still has room for one content token between the markers.
pub const MIN_CHUNK_LEN: usize = 3;

/// Split `tokens` into `chunk_len` windows framed as `<s> content </s> pad...`.
///
/// Each window holds up to `chunk_len - 2` content tokens. The end marker is
/// written right after the content of the final window and of every window
/// whose content region is full; since the content region is two shorter than
/// the window, the end marker always lands inside it. Empty input yields no
/// windows.
pub fn chunk_tokens(
    tokens: &[u32],
    special: SpecialTokens,
    chunk_len: usize,
) -> Result<Vec<Vec<u32>>> {
    if chunk_len < MIN_CHUNK_LEN {
        return Err(anyhow!(
            "chunk length must be at least {MIN_CHUNK_LEN}, got {chunk_len}"
        ));
    }

    let inner = chunk_len - 2;
    let num_chunks = tokens.len().div_ceil(inner);
    let mut chunks = Vec::with_capacity(num_chunks);

    for (idx, content) in tokens.chunks(inner).enumerate() {
        let mut chunk = vec![special.pad; chunk_len];
        chunk[0] = special.bos;
        chunk[1..=content.len()].copy_from_slice(content);

        let is_last = idx + 1 == num_chunks;
        if is_last || content.len() == inner {
            chunk[1 + content.len()] = special.eos;
        }
        chunks.push(chunk);
    }

    Ok(chunks)
}
