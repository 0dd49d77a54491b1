use std::path::Path;

use anyhow::{Result, anyhow};
use tokenizers::AddedToken;

use super::{BOS_TOKEN, EOS_TOKEN, PAD_TOKEN, SpecialTokens, Tokenizer};

/// HuggingFace `tokenizer.json` (GPT-2 by default) extended with the lyric markers.
pub struct PretrainedTokenizer {
    inner: tokenizers::Tokenizer,
    special: SpecialTokens,
}

impl PretrainedTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|err| anyhow!("failed to load tokenizer {}: {err}", path.display()))?;
        Self::from_tokenizer(inner)
    }

    pub fn from_tokenizer(mut inner: tokenizers::Tokenizer) -> Result<Self> {
        // The pad marker already exists in GPT-2's vocabulary, so only the
        // start and end markers receive new ids.
        inner.add_special_tokens(&[
            AddedToken::from(PAD_TOKEN, true),
            AddedToken::from(BOS_TOKEN, true),
            AddedToken::from(EOS_TOKEN, true),
        ]);

        let lookup = |token: &str| {
            inner
                .token_to_id(token)
                .ok_or_else(|| anyhow!("tokenizer is missing special token {token}"))
        };
        let special = SpecialTokens {
            pad: lookup(PAD_TOKEN)?,
            bos: lookup(BOS_TOKEN)?,
            eos: lookup(EOS_TOKEN)?,
        };

        Ok(Self { inner, special })
    }
}

impl Tokenizer for PretrainedTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|err| anyhow!("tokenizer encode failed: {err}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, false)
            .map_err(|err| anyhow!("tokenizer decode failed: {err}"))
    }

    fn len(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn special_tokens(&self) -> SpecialTokens {
        self.special
    }
}
