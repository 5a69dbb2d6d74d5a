use crate::error::SourceError;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Lazily decodes one JSON record per line.
///
/// Single forward pass. A malformed line yields an error and decoding resumes on
/// the next line; a read failure yields one error and ends the stream. Lines are
/// read as raw bytes, so invalid UTF-8 is reported as a malformed line.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    offset: u64,
    buf: Vec<u8>,
    done: bool,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => Ok(Self::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(SourceError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            offset: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// 1-based number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<Value, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let line_start = self.offset;
            let read = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(read) => read,
                Err(e) => {
                    self.done = true;
                    return Some(Err(SourceError::Io(e)));
                }
            };
            self.line += 1;
            self.offset += read as u64;

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Some(serde_json::from_slice(&self.buf).map_err(|source| {
                let column = source.column();
                SourceError::Malformed {
                    line: self.line,
                    column,
                    offset: line_start + column.saturating_sub(1) as u64,
                    source,
                }
            }));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_lazily() {
        let input = "{\"a\": 1}\n{\"a\": 2}\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert_eq!(source.next().unwrap().unwrap()["a"], 1);
        assert_eq!(source.line(), 1);
        assert_eq!(source.next().unwrap().unwrap()["a"], 2);
        assert!(source.next().is_none());
        assert!(source.next().is_none());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = "\n{\"a\": 1}\r\n   \n{\"a\": 2}";
        let values: Vec<_> = JsonLinesSource::new(Cursor::new(input))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_malformed_line_reports_position_and_continues() {
        let input = "{\"a\": 1}\n{\"a\": 1,, }\n{\"a\": 3}\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert!(source.next().unwrap().is_ok());
        match source.next().unwrap() {
            Err(SourceError::Malformed {
                line,
                column,
                offset,
                ..
            }) => {
                assert_eq!(line, 2);
                assert!(column > 0);
                assert_eq!(offset, 9 + column as u64 - 1);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
        assert_eq!(source.next().unwrap().unwrap()["a"], 3);
    }

    #[test]
    fn test_invalid_utf8_is_malformed_not_fatal() {
        let input = b"{\"a\": 1}\n{\"a\": \"A\xff\"}\n{\"a\": 3}\n".to_vec();
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert!(source.next().unwrap().is_ok());
        match source.next().unwrap() {
            Err(SourceError::Malformed { line, offset, .. }) => {
                assert_eq!(line, 2);
                assert!(offset >= 9);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
        assert_eq!(source.next().unwrap().unwrap()["a"], 3);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let err = JsonLinesSource::open("random_name.jsonl").err().unwrap();
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert_eq!(err.to_string(), "the file \"random_name.jsonl\" does not exist");
    }
}
