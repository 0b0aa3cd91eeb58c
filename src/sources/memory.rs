use anyhow::Result;

use super::{primary_dump::parse_positions, SampleKind};

/// Memory counters as in `/proc/<pid>/statm`, in pages (primary dump)
/// or as exported by collectd.
#[derive(Debug, Clone, Copy)]
pub struct Memory;

/// Positions in `/proc/<pid>/statm`: size resident shared text lib
/// data dt. `lib` (unused since Linux 2.6) and `dt` are skipped.
const SIZE: usize = 0;
const RESIDENT: usize = 1;
const SHARED: usize = 2;
const TEXT: usize = 3;
const DATA: usize = 5;

impl SampleKind for Memory {
    const KIND_NAME: &'static str = "Memory";

    const FIELDS: &'static [&'static str] = &["size", "resident", "shared", "text", "data"];

    const COLLECTD_COUNTERS: &'static [&'static str] =
        &["size", "resident", "shared", "text", "data"];

    const PRIMARY_LINE_WIDTH: usize = 7;

    /// statm carries no process name, so every line of the right
    /// width belongs to the process.
    fn parse_primary_line(entries: &[&str], _process_name: &str) -> Result<Option<Vec<i64>>> {
        parse_positions(entries, &[SIZE, RESIDENT, SHARED, TEXT, DATA]).map(Some)
    }

    fn collectd_probe_counter() -> &'static str {
        "resident"
    }
}
