//! Field delimiter detection for uploaded tabular sources

use crate::error::{Error, Result};

/// Delimiters tried by the fallback, in order
pub const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Detect the field delimiter of `data`.
///
/// A sniffing heuristic runs over the first `sample_len` bytes; if it cannot
/// commit to a delimiter, every candidate is tried against the header row
/// and the one yielding the most columns wins. `ParseFailure` when nothing
/// parses (including an empty source).
pub fn detect(data: &[u8], sample_len: usize) -> Result<u8> {
    if data.is_empty() {
        return Err(Error::ParseFailure("source is empty".to_string()));
    }

    let sample = &data[..data.len().min(sample_len)];
    match sniff(sample) {
        Ok(delimiter) => Ok(delimiter),
        Err(e) => {
            tracing::debug!(error = %e, "delimiter sniffing failed, trying candidates");
            fallback(data)
        }
    }
}

/// Sniff the delimiter from a sample: a candidate qualifies when it appears
/// the same number of times on every sampled line; the most frequent
/// qualifying candidate wins.
fn sniff(sample: &[u8]) -> Result<u8> {
    let text = String::from_utf8_lossy(sample);
    // The last sampled line may be cut mid-row; ignore it unless it is the
    // only one.
    let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() > 1 && !text.ends_with('\n') {
        lines.pop();
    }
    if lines.is_empty() {
        return Err(Error::ParseFailure("no sample lines".to_string()));
    }
    let lines = &lines[..lines.len().min(8)];

    let mut best: Option<(u8, usize)> = None;
    for candidate in CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| l.bytes().filter(|b| *b == candidate).count())
            .collect();
        let first = counts[0];
        if first == 0 || counts.iter().any(|c| *c != first) {
            continue;
        }
        if best.map_or(true, |(_, count)| first > count) {
            best = Some((candidate, first));
        }
    }

    best.map(|(delimiter, _)| delimiter)
        .ok_or_else(|| Error::ParseFailure("no consistent delimiter in sample".to_string()))
}

/// Try every candidate against the header row; keep the one producing the
/// most columns.
fn fallback(data: &[u8]) -> Result<u8> {
    let mut best: Option<(u8, usize)> = None;
    for candidate in CANDIDATES {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(candidate)
            .flexible(true)
            .from_reader(data);
        match reader.headers() {
            Ok(headers) if !headers.is_empty() => {
                let columns = headers.len();
                if best.map_or(true, |(_, count)| columns > count) {
                    best = Some((candidate, columns));
                }
            }
            _ => continue,
        }
    }

    best.map(|(delimiter, _)| delimiter).ok_or_else(|| {
        Error::ParseFailure("no delimiter candidate parses the source".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniffs_common_delimiters() {
        assert_eq!(detect(b"name,country\nAda,UK\n", 1024).unwrap(), b',');
        assert_eq!(detect(b"name;country\nAda;UK\n", 1024).unwrap(), b';');
        assert_eq!(detect(b"name\tcountry\nAda\tUK\n", 1024).unwrap(), b'\t');
        assert_eq!(detect(b"name|country\nAda|UK\n", 1024).unwrap(), b'|');
    }

    #[test]
    fn test_prefers_consistent_candidate() {
        // Commas appear but are inconsistent across lines; semicolons are
        // stable on every line.
        let data = b"name;note\nAda;likes,commas,a lot\nGrace;plain\n";
        assert_eq!(detect(data, 1024).unwrap(), b';');
    }

    #[test]
    fn test_fallback_picks_most_columns() {
        // Ragged rows defeat the consistency check; the fallback still
        // settles on the candidate with the widest header.
        let data = b"a,b\nc,d,e\n";
        assert_eq!(detect(data, 1024).unwrap(), b',');
    }

    #[test]
    fn test_single_column_source_defaults_to_comma() {
        let data = b"name\nAda\nGrace\n";
        assert_eq!(detect(data, 1024).unwrap(), b',');
    }

    #[test]
    fn test_empty_source_fails() {
        assert!(matches!(detect(b"", 1024), Err(Error::ParseFailure(_))));
    }

    #[test]
    fn test_truncated_sample_line_ignored() {
        // 1 KB sample cuts the second row in half; the partial line must
        // not break the count consistency check.
        let mut data = b"name,country\n".to_vec();
        data.extend(std::iter::repeat(b'x').take(1015));
        data.extend_from_slice(b",UK\nAda,UK\n");
        assert_eq!(detect(&data, 1024).unwrap(), b',');
    }
}
