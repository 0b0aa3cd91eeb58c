//! Text exports of collectd round-robin databases: one file per
//! counter, one `timestamp value` pair per line. All counter files of
//! a run are expected to have the same sampling ticks, and are zipped
//! by position, not by timestamp.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;

use super::{SampleKind, SampleSink};
use crate::warn;

/// The value collectd writes for ticks without data
pub const NO_DATA: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectdPoint {
    pub timestamp: String,
    pub value: i64,
}

/// `None` becomes 0, everything else is parsed as a finite float
/// and truncated.
pub fn parse_value(s: &str) -> Result<i64> {
    if s == NO_DATA {
        Ok(0)
    } else {
        let v: f64 = s
            .parse()
            .with_context(|| anyhow!("invalid collectd value {s:?}"))?;
        if !v.is_finite() {
            bail!("non-finite collectd value {s:?}")
        }
        Ok(v as i64)
    }
}

pub fn parse_line(line: &str) -> Result<CollectdPoint> {
    let mut items = line.split_whitespace();
    match (items.next(), items.next(), items.next()) {
        (Some(timestamp), Some(value), None) => Ok(CollectdPoint {
            timestamp: timestamp.to_owned(),
            value: parse_value(value)?,
        }),
        _ => bail!("expecting `timestamp value`, got {line:?}"),
    }
}

/// Returns None if the file can't be opened (reported as a
/// warning). Blank lines are ignored.
pub fn read_collectd_file(path: &Path) -> Result<Option<Vec<CollectdPoint>>> {
    let input = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("file not found, skipping for now! {path:?}: {e}");
            return Ok(None);
        }
    };
    let mut points = Vec::new();
    for (i, line) in BufReader::new(input).split(b'\n').enumerate() {
        let line = line.with_context(|| anyhow!("reading file {path:?}"))?;
        let line = String::from_utf8_lossy(&line);
        if line.trim().is_empty() {
            continue;
        }
        points.push(
            parse_line(&line).with_context(|| anyhow!("parsing file {path:?}:{}", i + 1))?,
        );
    }
    Ok(Some(points))
}

/// Read the files for `K::COLLECTD_COUNTERS` (`files` must be in that
/// order) and push one sample per position into `sink`. The number
/// of samples is that of the shortest file; a missing file means
/// there are none. Returns the number of samples pushed.
pub fn read_collectd_counters<K: SampleKind>(
    files: &[PathBuf],
    sink: &mut SampleSink,
) -> Result<usize> {
    if files.len() != K::COLLECTD_COUNTERS.len() {
        bail!(
            "need {} collectd files for {}, got {}",
            K::COLLECTD_COUNTERS.len(),
            K::KIND_NAME,
            files.len()
        )
    }
    let field_positions: Vec<usize> = K::COLLECTD_COUNTERS
        .iter()
        .map(|counter| {
            K::FIELDS
                .iter()
                .position(|field| field == counter)
                .ok_or_else(|| anyhow!("collectd counter {counter:?} is not a field"))
        })
        .collect::<Result<_>>()?;

    let mut streams = Vec::with_capacity(files.len());
    for path in files {
        match read_collectd_file(path)? {
            Some(points) => streams.push(points),
            None => return Ok(0),
        }
    }

    let lens: Vec<usize> = streams.iter().map(Vec::len).collect();
    let len = lens.iter().copied().min().unwrap_or(0);
    if !lens.iter().all_equal() {
        warn!("collectd files have different lengths {lens:?}, using {len}: {files:?}");
    }

    let mut fields = vec![0; K::FIELDS.len()];
    for i in 0..len {
        let first = &streams[0][i].timestamp;
        if !streams.iter().all(|s| &s[i].timestamp == first) {
            warn!(
                "timestamps are not equal at position {i}: {}",
                streams.iter().map(|s| &s[i].timestamp).join(" ")
            );
        }
        for (stream, pos) in streams.iter().zip(&field_positions) {
            fields[*pos] = stream[i].value;
        }
        sink.push(&fields)?;
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn t_parse_value() {
        assert_eq!(parse_value("None").unwrap(), 0);
        assert_eq!(parse_value("12").unwrap(), 12);
        assert_eq!(parse_value("12.9").unwrap(), 12);
        assert_eq!(parse_value("1.5e3").unwrap(), 1500);
        assert!(parse_value("none").is_err());
        assert!(parse_value("").is_err());
        for s in ["inf", "-inf", "NaN", "infinity"] {
            let err = parse_value(s).unwrap_err();
            assert!(err.to_string().contains("non-finite"), "{s}: {err}");
        }
    }

    #[test]
    fn t_non_finite_value_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1650000000 12\n1650000001 nan\n").unwrap();
        file.flush().unwrap();
        let err = read_collectd_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains(":2"), "{err:#}");
    }

    #[test]
    fn t_invalid_utf8_is_a_parse_error_not_a_read_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1650000000 12\n1650000001 1\xff\n").unwrap();
        file.flush().unwrap();
        let err = read_collectd_file(file.path()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("parsing file"), "{msg}");
        assert!(msg.contains("invalid collectd value"), "{msg}");
    }

    #[test]
    fn t_parse_line() {
        assert_eq!(
            parse_line("1650000000 3.0000000000e+01").unwrap(),
            CollectdPoint {
                timestamp: "1650000000".into(),
                value: 30
            }
        );
        assert_eq!(parse_line("1650000001 None").unwrap().value, 0);
        assert!(parse_line("1650000001").is_err());
        assert!(parse_line("1650000001 1 2").is_err());
    }
}
