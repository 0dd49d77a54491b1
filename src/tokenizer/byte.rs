use anyhow::{Result, anyhow};

use super::{BOS_TOKEN, EOS_TOKEN, PAD_TOKEN, SpecialTokens, Tokenizer};

const BYTE_VOCAB: u32 = 256;
const PAD_ID: u32 = BYTE_VOCAB;
const BOS_ID: u32 = BYTE_VOCAB + 1;
const EOS_ID: u32 = BYTE_VOCAB + 2;

/// Raw UTF-8 bytes plus the three lyric markers. Needs no downloaded vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn markers() -> [(&'static str, u32); 3] {
        [(PAD_TOKEN, PAD_ID), (BOS_TOKEN, BOS_ID), (EOS_TOKEN, EOS_ID)]
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len());
        let mut rest = text;
        'outer: while !rest.is_empty() {
            for (marker, id) in Self::markers() {
                if let Some(tail) = rest.strip_prefix(marker) {
                    ids.push(id);
                    rest = tail;
                    continue 'outer;
                }
            }
            let ch = rest
                .chars()
                .next()
                .ok_or_else(|| anyhow!("unexpected end of input"))?;
            let mut buf = [0u8; 4];
            ids.extend(ch.encode_utf8(&mut buf).bytes().map(u32::from));
            rest = &rest[ch.len_utf8()..];
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let mut bytes = Vec::with_capacity(ids.len());
        for &id in ids {
            match id {
                0..BYTE_VOCAB => bytes.push(id as u8),
                PAD_ID => bytes.extend_from_slice(PAD_TOKEN.as_bytes()),
                BOS_ID => bytes.extend_from_slice(BOS_TOKEN.as_bytes()),
                EOS_ID => bytes.extend_from_slice(EOS_TOKEN.as_bytes()),
                other => return Err(anyhow!("token id {other} out of range")),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn len(&self) -> usize {
        (EOS_ID + 1) as usize
    }

    fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            pad: PAD_ID,
            bos: BOS_ID,
            eos: EOS_ID,
        }
    }
}
