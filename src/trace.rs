//! Binary record of a self-played game.
//!
//! Layout: `b"A2G1"`, one version byte, a postcard-encoded [`GameRecord`], then
//! a little-endian CRC32C of every preceding byte.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move};

const MAGIC: &[u8; 4] = b"A2G1";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Seed of the game RNG.
    pub seed: u64,
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub final_score: u64,
    pub highest_tile: u32,
}

/// One game: every board the agent saw, the move it chose and the score after it.
///
/// `states` holds packed boards (see [`Board::pack`](crate::engine::Board::pack))
/// and has one more entry than `moves` and `scores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub meta: Meta,
    pub states: Vec<u64>,
    pub moves: Vec<u8>,
    pub scores: Vec<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("record holds {states} states for {moves} moves and {scores} scores")]
    Length { states: usize, moves: usize, scores: usize },
    #[error("tile {0} does not fit the packed board format")]
    Unpackable(u32),
}

/// Accumulates a [`GameRecord`] move by move.
pub struct Recorder {
    seed: u64,
    start_unix_s: u64,
    started: Instant,
    states: Vec<u64>,
    moves: Vec<u8>,
    scores: Vec<u64>,
}

impl Recorder {
    pub fn new(seed: u64, initial: &Board) -> Result<Self, TraceError> {
        let mut states = Vec::with_capacity(1024);
        states.push(pack(initial)?);
        Ok(Recorder {
            seed,
            start_unix_s: now_unix_seconds(),
            started: Instant::now(),
            states,
            moves: Vec::with_capacity(1024),
            scores: Vec::with_capacity(1024),
        })
    }

    /// Record `direction` and the board/score it led to.
    pub fn push(&mut self, direction: Move, board: &Board, score: u64) -> Result<(), TraceError> {
        self.states.push(pack(board)?);
        self.moves.push(direction.index());
        self.scores.push(score);
        Ok(())
    }

    pub fn finish(self) -> GameRecord {
        let highest_tile = self
            .states
            .iter()
            .map(|&raw| Board::unpack(raw).highest_tile())
            .max()
            .unwrap_or(0);
        let meta = Meta {
            seed: self.seed,
            steps: self.moves.len() as u32,
            start_unix_s: self.start_unix_s,
            elapsed_s: self.started.elapsed().as_secs_f32(),
            final_score: self.scores.last().copied().unwrap_or(0),
            highest_tile,
        };
        GameRecord { meta, states: self.states, moves: self.moves, scores: self.scores }
    }
}

fn pack(board: &Board) -> Result<u64, TraceError> {
    board.pack().ok_or_else(|| TraceError::Unpackable(board.highest_tile()))
}

impl GameRecord {
    fn check_lengths(&self) -> Result<(), TraceError> {
        let (states, moves, scores) = (self.states.len(), self.moves.len(), self.scores.len());
        if states != moves + 1 || scores != moves || self.meta.steps as usize != moves {
            return Err(TraceError::Length { states, moves, scores });
        }
        Ok(())
    }
}

pub fn encode_record(record: &GameRecord) -> Result<Vec<u8>, TraceError> {
    record.check_lengths()?;
    let body = postcard::to_allocvec(record)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + CHECKSUM_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn decode_record(bytes: &[u8]) -> Result<GameRecord, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }
    // Validate checksum first so a corrupt body never reaches the decoder.
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }
    if &content[..MAGIC.len()] != MAGIC || content[MAGIC.len()] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    let record: GameRecord = postcard::from_bytes(&content[HEADER_LEN..])?;
    record.check_lengths()?;
    Ok(record)
}

pub fn write_record<P: AsRef<Path>>(path: P, record: &GameRecord) -> Result<(), TraceError> {
    let data = encode_record(record)?;
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn read_record<P: AsRef<Path>>(path: P) -> Result<GameRecord, TraceError> {
    let data = fs::read(path)?;
    decode_record(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample() -> GameRecord {
        GameRecord {
            meta: Meta {
                seed: 42,
                steps: 2,
                start_unix_s: 1_700_000_000,
                elapsed_s: 0.25,
                final_score: 4,
                highest_tile: 4,
            },
            states: vec![0x1100_0000_0000_0000, 0x2000_0000_0000_0001, 0x0002_0000_0000_0011],
            moves: vec![3, 1],
            scores: vec![4, 4],
        }
    }

    #[test]
    fn file_round_trip() {
        let tmp = NamedTempFile::new().unwrap();
        write_record(tmp.path(), &sample()).unwrap();
        assert_eq!(read_record(tmp.path()).unwrap(), sample());
    }

    #[test]
    fn header_is_magic_and_version() {
        let bytes = encode_record(&sample()).unwrap();
        assert_eq!(&bytes[..4], b"A2G1");
        assert_eq!(bytes[4], VERSION);
    }

    #[test]
    fn checksum_mismatch() {
        let mut bytes = encode_record(&sample()).unwrap();
        bytes[HEADER_LEN] ^= 0xFF;
        assert!(matches!(decode_record(&bytes), Err(TraceError::Checksum)));
    }

    #[test]
    fn wrong_magic_with_valid_checksum() {
        let mut bytes = encode_record(&sample()).unwrap();
        bytes.truncate(bytes.len() - CHECKSUM_LEN);
        bytes[0] = b'X';
        let crc = crc32c::crc32c(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        assert!(matches!(decode_record(&bytes), Err(TraceError::MagicOrVersion)));
    }

    #[test]
    fn truncated_file() {
        assert!(matches!(decode_record(b"A2G"), Err(TraceError::Malformed)));
        let mut bytes = encode_record(&sample()).unwrap();
        bytes.truncate(bytes.len() - 5);
        assert!(decode_record(&bytes).is_err());
    }

    #[test]
    fn recorder_builds_consistent_record() {
        let start: Board = "2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
        let mut rec = Recorder::new(9, &start).unwrap();
        let after: Board = "4,0,0,0/0,0,0,0/0,0,0,0/0,0,0,2".parse().unwrap();
        rec.push(Move::Left, &after, 4).unwrap();
        let record = rec.finish();
        assert_eq!(record.meta.seed, 9);
        assert_eq!(record.meta.steps, 1);
        assert_eq!(record.meta.final_score, 4);
        assert_eq!(record.meta.highest_tile, 4);
        assert_eq!(record.moves, vec![3]);
        assert_eq!(Board::unpack(record.states[1]), after);
        assert!(encode_record(&record).is_ok());
    }

    #[test]
    fn recorder_rejects_huge_tiles() {
        let huge = Board::from_rows([[65536, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        assert!(matches!(Recorder::new(0, &huge), Err(TraceError::Unpackable(65536))));
    }

    #[test]
    fn inconsistent_lengths_are_rejected() {
        let mut record = sample();
        record.scores.pop();
        assert!(matches!(encode_record(&record), Err(TraceError::Length { states: 3, moves: 2, scores: 1 })));
    }
}
