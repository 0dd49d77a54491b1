mod batcher;
mod chunk;
mod lyrics;

pub use batcher::{ChunkBatcher, SequenceBatch};
pub use chunk::{MIN_CHUNK_LEN, chunk_tokens};
pub use lyrics::{LyricsCorpus, strip_section_markers};
