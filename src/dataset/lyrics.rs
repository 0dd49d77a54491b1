use std::path::Path;

use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use tracing::{info, warn};

use super::chunk::chunk_tokens;
use crate::config::CorpusConfig;
use crate::tokenizer::Tokenizer;

/// Song lyrics read from a CSV export, one entry per song.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LyricsCorpus {
    songs: Vec<String>,
}

impl LyricsCorpus {
    pub fn new(songs: Vec<String>) -> Self {
        Self { songs }
    }

    /// Read the lyrics column, skipping the configured header and trailer rows.
    pub fn from_csv(path: impl AsRef<Path>, cfg: &CorpusConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open lyrics csv {}", path.display()))?;

        let records = reader
            .records()
            .collect::<Result<Vec<StringRecord>, _>>()
            .with_context(|| format!("failed to parse lyrics csv {}", path.display()))?;

        let end = records.len().saturating_sub(cfg.skip_trailing_rows);
        let start = cfg.skip_header_rows.min(end);
        let marker = Regex::new(&cfg.section_marker_pattern).with_context(|| {
            format!(
                "invalid section marker pattern {:?}",
                cfg.section_marker_pattern
            )
        })?;

        let mut songs = Vec::with_capacity(end - start);
        for (row, record) in records[start..end].iter().enumerate() {
            let lyrics = record.get(cfg.lyrics_column).ok_or_else(|| {
                anyhow!(
                    "row {} of {} has no column {}",
                    start + row + 1,
                    path.display(),
                    cfg.lyrics_column
                )
            })?;
            songs.push(strip_section_markers(lyrics, &marker));
        }

        info!("Loaded {} songs from {}", songs.len(), path.display());
        Ok(Self { songs })
    }

    pub fn songs(&self) -> &[String] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Tokenize every song and frame it into training windows.
    pub fn chunks(&self, tokenizer: &dyn Tokenizer, chunk_len: usize) -> Result<Vec<Vec<u32>>> {
        let special = tokenizer.special_tokens();
        let mut all_chunks = Vec::new();
        for (idx, song) in self.songs.iter().enumerate() {
            let ids = tokenizer
                .encode(song)
                .with_context(|| format!("failed to tokenize song {idx}"))?;
            if ids.is_empty() {
                warn!("skipping empty song {idx}");
                continue;
            }
            all_chunks.extend(chunk_tokens(&ids, special, chunk_len)?);
        }

        info!(
            "Built {} chunks of {} tokens from {} songs",
            all_chunks.len(),
            chunk_len,
            self.songs.len()
        );
        Ok(all_chunks)
    }
}

/// Drop section headers such as `\n[Chorus]` from raw lyrics.
pub fn strip_section_markers(lyrics: &str, marker: &Regex) -> String {
    marker.replace_all(lyrics, "").into_owned()
}
