use std::fs;

use burn::tensor::backend::Backend as BackendTrait;
use burn_lyrics::config::CorpusConfig;
use burn_lyrics::dataset::{ChunkBatcher, LyricsCorpus, MIN_CHUNK_LEN, chunk_tokens};
use burn_lyrics::tokenizer::{ByteTokenizer, Tokenizer};
use burn_ndarray::NdArray;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

type Backend = NdArray<f32>;

#[test]
fn chunks_are_framed_and_padded() {
    let special = ByteTokenizer::new().special_tokens();
    let tokens: Vec<u32> = (0..10).collect();

    let chunks = chunk_tokens(&tokens, special, 6).expect("chunk");
    let (pad, bos, eos) = (special.pad, special.bos, special.eos);
    assert_eq!(
        chunks,
        vec![
            vec![bos, 0, 1, 2, 3, eos],
            vec![bos, 4, 5, 6, 7, eos],
            vec![bos, 8, 9, eos, pad, pad],
        ]
    );
}

#[test]
fn every_chunk_has_one_end_marker() {
    let special = ByteTokenizer::new().special_tokens();
    for len in [1usize, 7, 62, 63, 64, 200] {
        let tokens: Vec<u32> = (0..len as u32).map(|id| id % 200).collect();
        let chunks = chunk_tokens(&tokens, special, 64).expect("chunk");
        assert_eq!(chunks.len(), len.div_ceil(62));
        for chunk in &chunks {
            assert_eq!(chunk.len(), 64);
            assert_eq!(chunk[0], special.bos);
            assert_eq!(chunk.iter().filter(|&&id| id == special.eos).count(), 1);
        }
    }
}

#[test]
fn chunk_contents_reassemble_the_input() {
    let special = ByteTokenizer::new().special_tokens();
    let tokens: Vec<u32> = (0..137u32).map(|id| id % 250).collect();
    let chunks = chunk_tokens(&tokens, special, 16).expect("chunk");

    let mut rebuilt = Vec::new();
    let mut short = 0;
    for chunk in &chunks {
        let content: Vec<u32> = chunk[1..]
            .iter()
            .copied()
            .take_while(|&id| id != special.eos)
            .collect();
        if content.len() < 14 {
            short += 1;
        }
        rebuilt.extend(content);
    }
    assert_eq!(rebuilt, tokens);
    assert!(short <= 1);
}

#[test]
fn short_chunk_lengths_are_rejected() {
    let special = ByteTokenizer::new().special_tokens();
    assert!(chunk_tokens(&[1, 2, 3], special, MIN_CHUNK_LEN - 1).is_err());
    assert!(chunk_tokens(&[], special, 8).expect("chunk").is_empty());
}

#[test]
fn csv_corpus_skips_header_and_trailer() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("songs.csv");
    let mut content = String::from("id,title,lyrics\n");
    content.push_str("1,First,\"la la\n[Chorus]\nla la la\"\n");
    content.push_str("2,Second,\"hey there\n[Verse 2: Someone]\nhey\"\n");
    content.push_str("3,Third,\"\"\n");
    for row in 0..5 {
        content.push_str(&format!("footer {row}\n"));
    }
    fs::write(&path, content).expect("write csv");

    let corpus = LyricsCorpus::from_csv(&path, &CorpusConfig::default()).expect("corpus");
    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.songs()[0], "la la\nla la la");
    assert_eq!(corpus.songs()[1], "hey there\nhey");
    assert_eq!(corpus.songs()[2], "");
}

#[test]
fn csv_corpus_reports_missing_column() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("songs.csv");
    fs::write(&path, "id,title,lyrics\n1,only two\n").expect("write csv");

    let cfg = CorpusConfig {
        skip_trailing_rows: 0,
        ..CorpusConfig::default()
    };
    let err = LyricsCorpus::from_csv(&path, &cfg).expect_err("missing column");
    assert!(err.to_string().contains("no column 2"));
}

#[test]
fn empty_songs_produce_no_chunks() {
    let tokenizer = ByteTokenizer::new();
    let corpus = LyricsCorpus::new(vec![String::new(), "abc".to_string()]);
    let chunks = corpus.chunks(&tokenizer, 8).expect("chunks");
    assert_eq!(chunks.len(), 1);
}

#[test]
fn batches_shift_targets_by_one() {
    let tokenizer = ByteTokenizer::new();
    let corpus = LyricsCorpus::new(vec!["The quick brown fox jumps over the lazy dog. ".repeat(8)]);
    let chunks = corpus.chunks(&tokenizer, 16).expect("chunks");
    let total = chunks.len();
    let batcher = ChunkBatcher::new(chunks, 4).expect("batcher");
    assert_eq!(batcher.steps_per_epoch(), total / 4);
    assert_eq!(batcher.sequence_len(), 15);

    let device = <Backend as BackendTrait>::Device::default();
    let mut rng = StdRng::seed_from_u64(3);
    let batches: Vec<_> = batcher.epoch::<Backend, _>(&mut rng, &device).collect();
    assert_eq!(batches.len(), total / 4);

    for batch in batches {
        assert_eq!(batch.inputs.dims(), [4, 15]);
        assert_eq!(batch.targets.dims(), [4, 15]);

        let inputs = batch
            .inputs
            .to_data()
            .convert::<i64>()
            .into_vec::<i64>()
            .expect("inputs");
        let targets = batch
            .targets
            .to_data()
            .convert::<i64>()
            .into_vec::<i64>()
            .expect("targets");
        for row in 0..4 {
            let input_row = &inputs[row * 15..(row + 1) * 15];
            let target_row = &targets[row * 15..(row + 1) * 15];
            assert_eq!(input_row[0], tokenizer.special_tokens().bos as i64);
            assert_eq!(&input_row[1..], &target_row[..14]);
        }
    }
}

#[test]
fn batcher_rejects_ragged_chunks() {
    assert!(ChunkBatcher::new(vec![vec![1, 2, 3], vec![1, 2]], 1).is_err());
    assert!(ChunkBatcher::new(vec![vec![1, 2, 3]], 0).is_err());
}
