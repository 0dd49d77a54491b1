pub mod byte;
pub mod pretrained;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Cache, Repo, RepoType};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use byte::ByteTokenizer;
pub use pretrained::PretrainedTokenizer;

/// Padding marker. Shared with GPT-2's end-of-text token.
pub const PAD_TOKEN: &str = "<|endoftext|>";
/// Sequence-start marker.
pub const BOS_TOKEN: &str = "<s>";
/// Sequence-end marker.
pub const EOS_TOKEN: &str = "</s>";

/// Ids of the three reserved markers in a tokenizer's vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub bos: u32,
    pub eos: u32,
}

impl SpecialTokens {
    pub fn is_terminal(&self, id: u32) -> bool {
        id == self.eos || id == self.pad
    }
}

pub trait Tokenizer: Send + Sync {
    /// Encode text; literal marker strings map to their special ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    /// Decode ids, rendering special ids as their literal markers.
    fn decode(&self, ids: &[u32]) -> Result<String>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn special_tokens(&self) -> SpecialTokens;
}

pub type SharedTokenizer = Arc<dyn Tokenizer>;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenizerConfig {
    /// Local `tokenizer.json`; skips the hub download when set.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(flatten)]
    pub kind: TokenizerKind,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            path: None,
            cache_dir: default_cache_dir(),
            kind: TokenizerKind::Pretrained(PretrainedTokenizerConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenizerKind {
    Pretrained(PretrainedTokenizerConfig),
    Byte(ByteTokenizerConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PretrainedTokenizerConfig {
    #[serde(default = "default_repo_id")]
    pub repo_id: String,
    #[serde(default)]
    pub revision: Option<String>,
}

impl Default for PretrainedTokenizerConfig {
    fn default() -> Self {
        Self {
            repo_id: default_repo_id(),
            revision: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct ByteTokenizerConfig {}

impl TokenizerConfig {
    pub fn byte() -> Self {
        Self {
            kind: TokenizerKind::Byte(ByteTokenizerConfig::default()),
            ..Self::default()
        }
    }

    pub fn load(&self) -> Result<SharedTokenizer> {
        match &self.kind {
            TokenizerKind::Byte(_) => Ok(Arc::new(ByteTokenizer::new()) as SharedTokenizer),
            TokenizerKind::Pretrained(pretrained) => {
                let path = match &self.path {
                    Some(path) => path.clone(),
                    None => self.fetch_pretrained(pretrained)?,
                };
                let tokenizer = PretrainedTokenizer::from_file(&path)?;
                info!(
                    "Loaded tokenizer from {} with {} tokens",
                    path.display(),
                    tokenizer.len()
                );
                Ok(Arc::new(tokenizer) as SharedTokenizer)
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            TokenizerKind::Pretrained(_) => "pretrained",
            TokenizerKind::Byte(_) => "byte",
        }
    }

    fn fetch_pretrained(&self, cfg: &PretrainedTokenizerConfig) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("failed to create cache directory {}", self.cache_dir.display())
        })?;

        let token = std::env::var("HF_TOKEN")
            .ok()
            .or_else(|| Cache::from_env().token());

        let mut api_builder = ApiBuilder::new().with_cache_dir(self.cache_dir.clone());
        if let Some(token) = token {
            api_builder = api_builder.with_token(Some(token));
        }
        let api = api_builder
            .build()
            .context("failed to initialize huggingface hub client")?;

        let repo = match &cfg.revision {
            Some(revision) => {
                Repo::with_revision(cfg.repo_id.clone(), RepoType::Model, revision.clone())
            }
            None => Repo::new(cfg.repo_id.clone(), RepoType::Model),
        };

        api.repo(repo)
            .get("tokenizer.json")
            .with_context(|| format!("failed to download tokenizer.json from {}", cfg.repo_id))
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/cache")
}

fn default_repo_id() -> String {
    "openai-community/gpt2".to_string()
}
