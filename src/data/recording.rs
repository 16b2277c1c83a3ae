//! Fixed-layout recording parser
//!
//! A recording is plain text, one ASCII decimal sample per line. The window
//! sits after `header_lines + skip_lines` lines and spans `window_len` lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::RecordingLayout;
use crate::error::{ClassifierError, Result};

/// Read the sample window of a recording file
pub fn read_window(path: impl AsRef<Path>, layout: &RecordingLayout) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
    parse_window(BufReader::new(file), layout, path)
}

/// Parse the sample window from any line-oriented reader.
///
/// Lines are split on raw bytes, so header bytes in any encoding are
/// skipped unread. Lines past the window are never read. `path` is only used
/// in errors.
pub fn parse_window<R: BufRead>(
    reader: R,
    layout: &RecordingLayout,
    path: &Path,
) -> Result<Vec<f64>> {
    let start = layout.window_start();
    let mut values = Vec::with_capacity(layout.window_len);

    for (index, line) in reader
        .split(b'\n')
        .enumerate()
        .skip(start)
        .take(layout.window_len)
    {
        let line = line.map_err(|e| ClassifierError::io(path, e))?;
        let line_number = index + 1;
        let text = std::str::from_utf8(&line).map_err(|_| ClassifierError::Parse {
            path: path.to_path_buf(),
            line: line_number,
            value: String::from_utf8_lossy(&line).trim().to_string(),
        })?;
        values.push(parse_sample(text, line_number, path)?);
    }

    if values.len() < layout.window_len {
        return Err(ClassifierError::TruncatedFile {
            path: path.to_path_buf(),
            found: values.len(),
            expected: layout.window_len,
        });
    }

    Ok(values)
}

fn parse_sample(line: &str, line_number: usize, path: &Path) -> Result<f64> {
    let token = line.trim();
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ClassifierError::Parse {
            path: path.to_path_buf(),
            line: line_number,
            value: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn small_layout() -> RecordingLayout {
        RecordingLayout {
            header_lines: 2,
            skip_lines: 3,
            window_len: 4,
        }
    }

    fn parse(text: &str) -> Result<Vec<f64>> {
        parse_window(Cursor::new(text), &small_layout(), Path::new("test.pdr"))
    }

    #[test]
    fn test_window_extraction() {
        let text = "h1\nh2\n9\n9\n9\n1.5\n-2\n 3e1 \n4\n99\n";
        assert_eq!(parse(text).unwrap(), vec![1.5, -2.0, 30.0, 4.0]);
    }

    #[test]
    fn test_header_is_not_parsed() {
        let text = "not a number\n\n\n\n\n1\n2\n3\n4";
        assert_eq!(parse(text).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_crlf_lines() {
        let text = "h\r\nh\r\n0\r\n0\r\n0\r\n1\r\n2\r\n3\r\n4\r\n";
        assert_eq!(parse(text).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_truncated() {
        let text = "h\nh\n0\n0\n0\n1\n2\n3\n";
        match parse(text) {
            Err(ClassifierError::TruncatedFile { found, expected, .. }) => {
                assert_eq!(found, 3);
                assert_eq!(expected, 4);
            }
            other => panic!("expected TruncatedFile, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_sample() {
        let text = "h\nh\n0\n0\n0\n1\nabc\n3\n4\n";
        match parse(text) {
            Err(ClassifierError::Parse { line, value, .. }) => {
                assert_eq!(line, 7);
                assert_eq!(value, "abc");
            }
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let text = "h\nh\n0\n0\n0\n1\nNaN\n3\n4\n";
        assert!(matches!(parse(text), Err(ClassifierError::Parse { .. })));
    }

    #[test]
    fn test_invalid_utf8_sample_is_parse_error() {
        let mut bytes = b"h\nh\n0\n0\n0\n1\n".to_vec();
        bytes.extend_from_slice(&[0xff, b'1', b'\n']);
        bytes.extend_from_slice(b"3\n4\n");

        let err = parse_window(Cursor::new(bytes), &small_layout(), Path::new("test.pdr"))
            .unwrap_err();
        assert!(err.is_recording_error());
        match err {
            ClassifierError::Parse { line, value, .. } => {
                assert_eq!(line, 7);
                assert_eq!(value, "\u{FFFD}1");
            }
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_header_is_skipped() {
        let mut bytes = vec![b'E', b's', b'p', 0xa1, b'\n'];
        bytes.extend_from_slice(b"h\n0\n0\n0\n1\n2\n3\n4\n");

        let values = parse_window(Cursor::new(bytes), &small_layout(), Path::new("test.pdr"));
        assert_eq!(values.unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_window("/definitely/not/here.pdr", &small_layout()).unwrap_err();
        assert!(matches!(err, ClassifierError::FileNotFound { .. }));
    }
}
