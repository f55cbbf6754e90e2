use super::{LogParser, ParsedLine, ReaderError};
use encoding_rs::UTF_8;
use memchr::{memchr_iter, memrchr};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

/// Lines always scanned for session, version and login markers.
pub const HEADER_LINES: usize = 500;
/// Bytes from the end of the file searched for the server id.
pub const TAIL_WINDOW_BYTES: u64 = 50_000;
/// Lines of the tail window that are actually inspected.
pub const TAIL_WINDOW_LINES: usize = 100;

/// Parsed lines plus the offset just past the last complete line consumed.
#[derive(Debug, Default)]
pub struct Batch {
    pub events: Vec<ParsedLine>,
    pub line_count: usize,
    pub end_offset: u64,
}

/// Byte-level access to one log file. Only lines terminated by `\n` are
/// consumed; a partially written trailing line is left for the next read.
#[derive(Debug, Clone)]
pub struct Reader {
    path: PathBuf,
    parser: LogParser,
}

impl Reader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parser: LogParser::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn size(&self) -> Result<u64, ReaderError> {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .map_err(|source| ReaderError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })
    }

    /// First `limit` lines, parsed. Non-header lines are returned too; the
    /// caller decides what to keep.
    pub async fn read_header(&self, limit: usize) -> Result<Vec<ParsedLine>, ReaderError> {
        let file = self.open().await?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut parsed = Vec::new();

        for _ in 0..limit {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source| self.read_error(source))?;
            if read == 0 {
                break;
            }
            let (line, _, _) = UTF_8.decode(&buf);
            if let Some(event) = self.parser.parse_line(line.trim_end()) {
                parsed.push(event);
            }
        }
        Ok(parsed)
    }

    /// Whole file through a memory map, parsed in parallel. Output keeps file order.
    pub fn read_all(&self) -> Result<Batch, ReaderError> {
        let file = fs::File::open(&self.path).map_err(|source| ReaderError::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        let len = file.metadata().map_err(|source| self.read_error(source))?.len();
        if len == 0 {
            return Ok(Batch::default());
        }

        // SAFETY: the game only appends; a concurrent truncate is caught by
        // the size check on the next poll.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| ReaderError::MemoryMap {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.parse_chunk(mmap.as_ref(), 0))
    }

    /// Everything from `offset` to the last complete line.
    pub async fn read_from(&self, offset: u64) -> Result<Batch, ReaderError> {
        let mut file = self.open().await?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|source| ReaderError::Seek {
                path: self.path.clone(),
                source,
            })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(|source| self.read_error(source))?;
        Ok(self.parse_chunk(&bytes, offset))
    }

    /// Newest server id within the tail window, if any.
    pub async fn tail_server_id(&self) -> Result<Option<String>, ReaderError> {
        let size = self.size().await?;
        let start = size.saturating_sub(TAIL_WINDOW_BYTES);

        let mut file = self.open().await?;
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|source| ReaderError::Seek {
                path: self.path.clone(),
                source,
            })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(|source| self.read_error(source))?;

        let (text, _, _) = UTF_8.decode(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        let window = &lines[lines.len().saturating_sub(TAIL_WINDOW_LINES)..];
        Ok(window.iter().rev().find_map(|line| LogParser::parse_server_id(line)))
    }

    fn parse_chunk(&self, bytes: &[u8], base_offset: u64) -> Batch {
        let Some(last_newline) = memrchr(b'\n', bytes) else {
            return Batch {
                end_offset: base_offset,
                ..Default::default()
            };
        };
        let complete = &bytes[..=last_newline];

        let mut line_ranges: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;
        for end in memchr_iter(b'\n', complete) {
            line_ranges.push((start, end));
            start = end + 1;
        }

        let parser = self.parser;
        let events: Vec<ParsedLine> = line_ranges
            .par_iter()
            .filter_map(|&(start, end)| {
                let (line, _, _) = UTF_8.decode(&complete[start..end]);
                parser.parse_line(line.trim_end())
            })
            .collect();

        Batch {
            events,
            line_count: line_ranges.len(),
            end_offset: base_offset + complete.len() as u64,
        }
    }

    async fn open(&self) -> Result<File, ReaderError> {
        File::open(&self.path)
            .await
            .map_err(|source| ReaderError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })
    }

    fn read_error(&self, source: std::io::Error) -> ReaderError {
        ReaderError::ReadFile {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat_log::LogLine;
    use std::io::Write;

    const SESSION: &str = "<2025-06-01T18:00:00.000Z> @session: 'abc-123'\n";
    const STALL: &str = "<2025-06-01T18:32:00.000Z> <Actor stall> Actor stall detected, Player: Bob, Type: downstream\n";

    fn write(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("Game.log");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn partial_trailing_line_is_left_for_later() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!("{SESSION}{}", STALL.trim_end());
        let path = write(&dir, &content);
        let reader = Reader::new(&path);

        let batch = reader.read_from(0).await.unwrap();
        assert_eq!(batch.line_count, 1);
        assert_eq!(batch.end_offset, SESSION.len() as u64);
        assert_eq!(batch.events[0].line, LogLine::Session("abc-123".into()));

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\n").unwrap();

        let batch = reader.read_from(batch.end_offset).await.unwrap();
        assert_eq!(batch.line_count, 1);
        assert_eq!(batch.end_offset, content.len() as u64 + 1);
        assert_eq!(batch.events[0].line, LogLine::ActorStall { player: "Bob".into() });
    }

    #[test]
    fn full_scan_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &format!("{SESSION}noise line\r\n{STALL}"));
        let batch = Reader::new(&path).read_all().unwrap();

        assert_eq!(batch.line_count, 3);
        assert_eq!(batch.events.len(), 2);
        assert!(batch.events[0].line.is_header());
        assert!(matches!(batch.events[1].line, LogLine::ActorStall { .. }));
    }

    #[test]
    fn empty_file_scans_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "");
        let batch = Reader::new(&path).read_all().unwrap();
        assert_eq!(batch.end_offset, 0);
        assert!(batch.events.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_source_unavailable() {
        let reader = Reader::new("/definitely/not/here/Game.log");
        assert!(matches!(
            reader.size().await,
            Err(ReaderError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn tail_window_prefers_newest_server_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "Connected to Server ID: aaaa-1111\nfiller\nConnected to Server ID: bbbb-2222\n",
        );
        let id = Reader::new(&path).tail_server_id().await.unwrap();
        assert_eq!(id.as_deref(), Some("bbbb-2222"));
    }

    #[tokio::test]
    async fn header_read_stops_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &format!("filler\n{SESSION}"));
        assert!(Reader::new(&path).read_header(1).await.unwrap().is_empty());
        assert_eq!(Reader::new(&path).read_header(HEADER_LINES).await.unwrap().len(), 1);
    }
}
