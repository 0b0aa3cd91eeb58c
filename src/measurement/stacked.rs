//! The last `history` runs side by side, aligned on the sample index,
//! for comparing CPU usage over time.

use anyhow::{bail, Result};

use super::{sample_history::CpuHistory, Measurement};
use crate::{
    row_table::RowTable,
    run_folder::RunFolder,
    schema::{int_records, Record, Schema},
    sources::int,
};

pub struct CpuHistoryStacked {
    name: String,
    history: usize,
    data_length: usize,
    /// `id` followed by `(utime, stime)` per run, most recent run
    /// first
    table: RowTable,
}

impl CpuHistoryStacked {
    pub fn new(name: impl Into<String>, history: usize, data_length: usize) -> Self {
        Self {
            name: name.into(),
            history,
            data_length,
            table: RowTable::new(data_length, 1 + 2 * history),
        }
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn table(&self) -> &RowTable {
        &self.table
    }

    /// Fill from `cpu`, which must have been postprocessed with
    /// `folders`. Column pairs for runs beyond those available stay
    /// zero.
    pub fn build(&mut self, folders: &[RunFolder], cpu: &CpuHistory) -> Result<()> {
        let data_length = self.data_length;
        if cpu.data_length() != data_length {
            bail!(
                "stacked table {:?} has data length {data_length}, CPU table has {}",
                self.name,
                cpu.data_length()
            )
        }
        if folders.len() > cpu.data_amount() {
            bail!(
                "CPU table holds {} runs, got {} folders",
                cpu.data_amount(),
                folders.len()
            )
        }
        let (Some(utime_col), Some(stime_col)) = (
            CpuHistory::field_column("utime"),
            CpuHistory::field_column("stime"),
        ) else {
            bail!("CPU table has no utime or stime column")
        };

        let mut rows: Vec<Vec<i64>> = (0..data_length)
            .map(|sample| {
                let mut row = vec![0; self.table.num_cols()];
                row[0] = int(sample);
                row
            })
            .collect();
        for (column_pair, position) in (0..folders.len()).rev().take(self.history).enumerate() {
            let col = 1 + 2 * column_pair;
            for (sample, row) in rows.iter_mut().enumerate() {
                let row_id = position * data_length + sample;
                row[col] = cpu.table().get(row_id, utime_col);
                row[col + 1] = cpu.table().get(row_id, stime_col);
            }
        }
        for (sample, row) in rows.iter().enumerate() {
            self.table.insert(sample, row)?;
        }
        Ok(())
    }
}

impl Measurement for CpuHistoryStacked {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Schema {
        let mut names = vec!["id".to_string()];
        for i in 0..self.history {
            names.push(format!("t{i}u"));
            names.push(format!("t{i}s"));
        }
        Schema::int64(names)
    }

    fn records(&self) -> Vec<Record> {
        int_records(
            &self.schema(),
            self.table.rows().map(|row| row.into_iter().copied()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SampleSink;

    /// A CPU table where run `mid` has utime `10*mid + sample + 1` and
    /// stime `100*mid + sample + 1`
    fn cpu_table(num_runs: usize, data_length: usize) -> CpuHistory {
        let mut cpu = CpuHistory::new("cpu", num_runs, data_length).unwrap();
        for mid in 0..num_runs {
            let mut sink = SampleSink::new(cpu.table_mut_for_tests(), mid, data_length);
            for sample in 0..data_length {
                let (m, s) = (int(mid), int(sample));
                sink.push(&[10 * m + s + 1, 100 * m + s + 1, 0, 0]).unwrap();
            }
            sink.finish().unwrap();
        }
        cpu
    }

    fn folders(n: usize) -> Vec<RunFolder> {
        (0..n)
            .map(|i| format!("results_{}_unpack", i + 40).parse().unwrap())
            .collect()
    }

    #[test]
    fn t_fewer_runs_than_history() {
        let cpu = cpu_table(3, 2);
        let mut stacked = CpuHistoryStacked::new("ci_cpu_hist", 10, 2);
        stacked.build(&folders(3), &cpu).unwrap();
        assert_eq!(stacked.table().num_cols(), 21);
        // most recent run (mid 2) first
        assert_eq!(
            stacked.table().row(0).to_vec()[..7],
            [0, 21, 201, 11, 101, 1, 1]
        );
        assert_eq!(
            stacked.table().row(1).to_vec()[..7],
            [1, 22, 202, 12, 102, 2, 2]
        );
        assert!(stacked.table().row(1).iter().skip(7).all(|v| *v == 0));
        assert_eq!(stacked.schema().len(), 21);
        assert_eq!(stacked.records().len(), 2);
    }

    #[test]
    fn t_more_runs_than_history() {
        let cpu = cpu_table(4, 1);
        let mut stacked = CpuHistoryStacked::new("ci_cpu_hist", 2, 1);
        stacked.build(&folders(4), &cpu).unwrap();
        assert_eq!(stacked.table().row(0).to_vec(), vec![0, 31, 301, 21, 201]);
        let schema = stacked.schema();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, ["id", "t0u", "t0s", "t1u", "t1s"]);
    }

    #[test]
    fn t_data_length_mismatch() {
        let cpu = cpu_table(1, 3);
        let mut stacked = CpuHistoryStacked::new("ci_cpu_hist", 2, 2);
        assert!(stacked.build(&folders(1), &cpu).is_err());
    }
}
