//! Building synthetic lake directories for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use run_statistics::run_folder::RunFolder;
use tempfile::{tempdir, TempDir};

pub const TEST_NAME: &str = "publish_sawmill_record_statistics";
pub const PROCESS: &str = "tedge-mapper";
pub const CPU_KEY: &str = "stat_mapper_stdout";
pub const MEM_KEY: &str = "statm_mapper_stdout";
pub const GAUGE: &str = "gauge-mapper-c8y";

pub struct Lake {
    dir: TempDir,
}

impl Lake {
    pub fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates the run folder
    pub fn folder(&self, n: u64) -> RunFolder {
        let name = format!("results_{n}_unpack");
        std::fs::create_dir_all(self.path().join(&name)).unwrap();
        name.parse().unwrap()
    }

    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn linux_dir(n: u64, analytics: bool) -> PathBuf {
        let mut path = PathBuf::from(format!("results_{n}_unpack/PySys"));
        if analytics {
            path.push("analytics");
        }
        path.join(TEST_NAME).join("Output/linux")
    }

    pub fn write_primary(&self, n: u64, key: &str, lines: &[String]) -> PathBuf {
        let mut contents = lines.join("\n");
        contents.push('\n');
        self.write(Self::linux_dir(n, false).join(format!("{key}.out")), &contents)
    }

    pub fn write_collectd(&self, n: u64, analytics: bool, counter: &str, values: &[&str]) -> PathBuf {
        self.write_collectd_from(n, analytics, counter, 1650000000, values)
    }

    /// Like `write_collectd`, with ticks starting at `first_timestamp`
    pub fn write_collectd_from(
        &self,
        n: u64,
        analytics: bool,
        counter: &str,
        first_timestamp: u64,
        values: &[&str],
    ) -> PathBuf {
        let contents: String = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{} {v}\n", first_timestamp + i as u64))
            .collect();
        self.write(
            Self::linux_dir(n, analytics).join(format!("{GAUGE}-{counter}.rrd.txt")),
            &contents,
        )
    }

    pub fn write_metadata(&self, n: u64) -> PathBuf {
        let contents = format!(
            r#"{{
    "id": {},
    "run_number": {n},
    "updated_at": "2022-06-0{}T08:00:00Z",
    "html_url": "https://github.com/thin-edge/thin-edge.io/actions/runs/{}",
    "name": "system-test-workflow",
    "head_branch": "main",
    "conclusion": "success"
}}
"#,
            1000 + n,
            n % 10,
            1000 + n
        );
        self.write(format!("system_test_{n}_metadata.json"), &contents)
    }
}

/// A `/proc/<pid>/stat` line, 52 fields
pub fn stat_line(process_name: &str, utime: i64, stime: i64) -> String {
    let mut fields: Vec<String> = vec!["4242".into(), format!("({process_name})"), "S".into()];
    for i in 3..52 {
        fields.push(match i {
            13 => utime.to_string(),
            14 => stime.to_string(),
            _ => "0".into(),
        });
    }
    fields.join(" ")
}

/// What `/proc/<pid>/stat` resolves to once the process is gone
pub fn proc_stat_line() -> String {
    "cpu  2255 34 2290 22625563 6290 127 456 0 0 0".into()
}

/// A `/proc/<pid>/statm` line: size resident shared text lib data dt
pub fn statm_line(size: i64, resident: i64, shared: i64, text: i64, data: i64) -> String {
    format!("{size} {resident} {shared} {text} 0 {data} 0")
}
