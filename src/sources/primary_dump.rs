//! The primary source: a file with one `/proc/<pid>/stat` (or
//! `statm`) snapshot per line, taken once per sampling interval.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{anyhow, Context, Result};

use super::{SampleKind, SampleSink};
use crate::{debug, warn};

/// Feed the valid lines of the dump at `path` into `sink`. A file
/// that can't be opened is reported and yields no samples. Returns
/// the number of accepted lines (including ones the sink dropped).
pub fn read_primary_dump<K: SampleKind>(
    path: &Path,
    process_name: &str,
    sink: &mut SampleSink,
) -> Result<usize> {
    let input = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("file not found, skipping for now! {path:?}: {e}");
            return Ok(0);
        }
    };
    let mut num_accepted = 0;
    for (i, line) in BufReader::new(input).split(b'\n').enumerate() {
        let linenum = i + 1;
        let line = line.with_context(|| anyhow!("reading file {path:?}"))?;
        // Undecodable bytes (e.g. in a process name) only spoil their line
        let line = String::from_utf8_lossy(&line);
        let entries: Vec<&str> = line.split_whitespace().collect();
        // When the process is gone, /proc/<pid>/stat may have been
        // resolved to /proc/stat; those lines have a different width
        // (or another process name) and are skipped.
        if entries.len() != K::PRIMARY_LINE_WIDTH {
            debug!(
                "{path:?}:{linenum}: skipping line with {} instead of {} fields",
                entries.len(),
                K::PRIMARY_LINE_WIDTH
            );
            continue;
        }
        let fields = K::parse_primary_line(&entries, process_name)
            .with_context(|| anyhow!("parsing file {path:?}:{linenum}"))?;
        if let Some(fields) = fields {
            num_accepted += 1;
            sink.push(&fields)?;
        } else {
            debug!("{path:?}:{linenum}: skipping line for another process");
        }
    }
    Ok(num_accepted)
}

/// Parse `entries[i]` for each of `positions` as an integer.
pub fn parse_positions(entries: &[&str], positions: &[usize]) -> Result<Vec<i64>> {
    positions
        .iter()
        .map(|&i| {
            let s = entries
                .get(i)
                .ok_or_else(|| anyhow!("missing field {i}"))?;
            s.parse::<i64>()
                .with_context(|| anyhow!("field {i} is not an integer: {s:?}"))
        })
        .collect()
}
