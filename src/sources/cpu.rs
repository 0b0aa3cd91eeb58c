use anyhow::Result;

use super::{primary_dump::parse_positions, SampleKind};

/// CPU time counters, in clock ticks.
#[derive(Debug, Clone, Copy)]
pub struct Cpu;

/// Positions in `/proc/<pid>/stat` (see proc(5)), zero-based
const UTIME: usize = 13;
const STIME: usize = 14;
const CUTIME: usize = 15;
const CSTIME: usize = 16;

impl SampleKind for Cpu {
    const KIND_NAME: &'static str = "CPU";

    const FIELDS: &'static [&'static str] = &["utime", "stime", "cutime", "cstime"];

    // cutime and cstime are not exported; there are no child processes
    const COLLECTD_COUNTERS: &'static [&'static str] = &["utime", "stime"];

    const PRIMARY_LINE_WIDTH: usize = 52;

    fn parse_primary_line(entries: &[&str], process_name: &str) -> Result<Option<Vec<i64>>> {
        let comm = entries.get(1).copied().unwrap_or("");
        let is_process = comm
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .map_or(false, |name| name == process_name);
        if !is_process {
            return Ok(None);
        }
        parse_positions(entries, &[UTIME, STIME, CUTIME, CSTIME]).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A `/proc/<pid>/stat` line with the given times, 52 fields
    fn stat_line(process_name: &str, utime: i64, stime: i64, cutime: i64, cstime: i64) -> String {
        let mut fields: Vec<String> = vec!["4242".into(), format!("({process_name})"), "S".into()];
        for i in 3..52 {
            fields.push(match i {
                UTIME => utime.to_string(),
                STIME => stime.to_string(),
                CUTIME => cutime.to_string(),
                CSTIME => cstime.to_string(),
                _ => "0".into(),
            });
        }
        fields.join(" ")
    }

    #[test]
    fn t_parse_primary_line() {
        let line = stat_line("tedge-mapper", 11, 22, 33, 44);
        let entries: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(entries.len(), Cpu::PRIMARY_LINE_WIDTH);
        assert_eq!(
            Cpu::parse_primary_line(&entries, "tedge-mapper").unwrap(),
            Some(vec![11, 22, 33, 44])
        );
        assert_eq!(Cpu::parse_primary_line(&entries, "mosquitto").unwrap(), None);
        assert_eq!(Cpu::parse_primary_line(&entries, "tedge").unwrap(), None);
    }

    #[test]
    fn t_parse_primary_line_invalid_number() {
        let line = stat_line("m", 1, 2, 3, 4).replacen(" 1 2 3 4 ", " 1 x 3 4 ", 1);
        let entries: Vec<&str> = line.split_whitespace().collect();
        assert!(Cpu::parse_primary_line(&entries, "m").is_err());
    }
}
