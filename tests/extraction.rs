mod common;

use common::*;
use run_statistics::{
    artifact_layout::{ArtifactLayout, CollectdLayout, GaugePrefixes},
    measurement::{
        sample_history::{CpuHistory, MemoryHistory},
        Measurement,
    },
    run_folder::RunFolder,
    sources::RunSource,
};
use serde_json::Value;

fn cpu_history(lake: &Lake, folders: &[RunFolder], data_amount: usize, data_length: usize) -> CpuHistory {
    let mut cpu = CpuHistory::new("cpu", data_amount, data_length).unwrap();
    cpu.postprocess(
        &ArtifactLayout::new(lake.path()),
        &GaugePrefixes::default(),
        folders,
        TEST_NAME,
        CPU_KEY,
        PROCESS,
    )
    .unwrap();
    cpu
}

fn rows(cpu: &CpuHistory) -> Vec<Vec<i64>> {
    cpu.table().rows().map(|row| row.to_vec()).collect()
}

#[test]
fn primary_dump_with_noise_and_padding() {
    let lake = Lake::new();
    let folder = lake.folder(7);
    lake.write_primary(
        7,
        CPU_KEY,
        &[
            stat_line(PROCESS, 12, 3),
            stat_line("mosquitto", 99, 99),
            "".into(),
            stat_line(PROCESS, 15, 4),
            proc_stat_line(),
        ],
    );
    let cpu = cpu_history(&lake, &[folder], 1, 3);
    assert_eq!(
        rows(&cpu),
        vec![
            vec![0, 0, 0, 12, 3, 0, 0],
            vec![1, 0, 1, 15, 4, 0, 0],
            vec![2, 0, 2, 0, 0, 0, 0],
        ]
    );
    assert!(matches!(cpu.sources()[0], RunSource::PrimaryDump(_)));
}

#[test]
fn missing_run_is_zero_filled_in_its_block() {
    let lake = Lake::new();
    let folders = vec![lake.folder(3), lake.folder(4), lake.folder(5)];
    lake.write_primary(3, CPU_KEY, &[stat_line(PROCESS, 1, 1), stat_line(PROCESS, 2, 2)]);
    lake.write_primary(5, CPU_KEY, &[stat_line(PROCESS, 5, 5), stat_line(PROCESS, 6, 6)]);
    let cpu = cpu_history(&lake, &folders, 3, 2);
    assert_eq!(
        rows(&cpu),
        vec![
            vec![0, 0, 0, 1, 1, 0, 0],
            vec![1, 0, 1, 2, 2, 0, 0],
            vec![2, 1, 0, 0, 0, 0, 0],
            vec![3, 1, 1, 0, 0, 0, 0],
            vec![4, 2, 0, 5, 5, 0, 0],
            vec![5, 2, 1, 6, 6, 0, 0],
        ]
    );
    assert_eq!(cpu.sources()[1], RunSource::Missing);
}

#[test]
fn excess_samples_are_dropped() {
    let lake = Lake::new();
    let folders = vec![lake.folder(1), lake.folder(2)];
    let lines: Vec<String> = (1..=5).map(|i| stat_line(PROCESS, i, 10 * i)).collect();
    lake.write_primary(1, CPU_KEY, &lines);
    lake.write_primary(2, CPU_KEY, &[stat_line(PROCESS, 100, 200)]);
    let cpu = cpu_history(&lake, &folders, 2, 3);
    let rows = rows(&cpu);
    assert_eq!(rows[2], vec![2, 0, 2, 3, 30, 0, 0]);
    assert_eq!(rows[3], vec![3, 1, 0, 100, 200, 0, 0]);
    assert_eq!(rows[5], vec![5, 1, 2, 0, 0, 0, 0]);
}

#[test]
fn collectd_layouts() {
    let lake = Lake::new();
    let folders = vec![lake.folder(10), lake.folder(11)];
    lake.write_collectd(10, true, "utime", &["1.9", "None", "3"]);
    lake.write_collectd(10, true, "stime", &["4", "5.5"]);
    lake.write_collectd(11, false, "utime", &["7", "8"]);
    lake.write_collectd(11, false, "stime", &["9", "1e1"]);
    let cpu = cpu_history(&lake, &folders, 2, 3);
    assert_eq!(
        rows(&cpu),
        vec![
            // shortest stream wins, then padding
            vec![0, 0, 0, 1, 4, 0, 0],
            vec![1, 0, 1, 0, 5, 0, 0],
            vec![2, 0, 2, 0, 0, 0, 0],
            vec![3, 1, 0, 7, 9, 0, 0],
            vec![4, 1, 1, 8, 10, 0, 0],
            vec![5, 1, 2, 0, 0, 0, 0],
        ]
    );
    assert!(matches!(
        cpu.sources()[0],
        RunSource::Collectd {
            layout: CollectdLayout::Analytics,
            ..
        }
    ));
    assert!(matches!(
        cpu.sources()[1],
        RunSource::Collectd {
            layout: CollectdLayout::Legacy,
            ..
        }
    ));
}

#[test]
fn collectd_missing_counter_file_means_no_samples() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    lake.write_collectd(1, true, "utime", &["1", "2"]);
    let cpu = cpu_history(&lake, &[folder], 1, 2);
    assert_eq!(
        rows(&cpu),
        vec![vec![0, 0, 0, 0, 0, 0, 0], vec![1, 0, 1, 0, 0, 0, 0]]
    );
}

#[test]
fn primary_dump_takes_precedence() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    lake.write_primary(1, CPU_KEY, &[stat_line(PROCESS, 42, 43)]);
    lake.write_collectd(1, true, "utime", &["1"]);
    lake.write_collectd(1, true, "stime", &["2"]);
    let cpu = cpu_history(&lake, &[folder], 1, 1);
    assert_eq!(rows(&cpu), vec![vec![0, 0, 0, 42, 43, 0, 0]]);
}

#[test]
fn invalid_number_is_fatal() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    let line = stat_line(PROCESS, 1, 2).replacen(" 1 2 ", " 1 x ", 1);
    lake.write_primary(1, CPU_KEY, &[line]);
    let mut cpu = CpuHistory::new("cpu", 1, 1).unwrap();
    let err = cpu
        .postprocess(
            &ArtifactLayout::new(lake.path()),
            &GaugePrefixes::default(),
            &[folder],
            TEST_NAME,
            CPU_KEY,
            PROCESS,
        )
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("stat_mapper_stdout.out\":1"), "{msg}");
    assert!(msg.contains("not an integer"), "{msg}");
}

#[test]
fn memory_from_primary_and_collectd() {
    let lake = Lake::new();
    let folders = vec![lake.folder(1), lake.folder(2)];
    lake.write_primary(
        1,
        MEM_KEY,
        &[statm_line(100, 50, 20, 10, 30), "garbage".into()],
    );
    lake.write_collectd(2, true, "size", &["1000", "1001"]);
    lake.write_collectd(2, true, "resident", &["500", "501"]);
    lake.write_collectd(2, true, "shared", &["200", "None"]);
    lake.write_collectd(2, true, "text", &["100", "101"]);
    lake.write_collectd(2, true, "data", &["300", "301"]);

    let mut mem = MemoryHistory::new("mem", 2, 2).unwrap();
    mem.postprocess(
        &ArtifactLayout::new(lake.path()),
        &GaugePrefixes::default(),
        &folders,
        TEST_NAME,
        MEM_KEY,
        PROCESS,
    )
    .unwrap();
    let rows: Vec<Vec<i64>> = mem.table().rows().map(|row| row.to_vec()).collect();
    assert_eq!(
        rows,
        vec![
            vec![0, 0, 0, 100, 50, 20, 10, 30],
            vec![1, 0, 1, 0, 0, 0, 0, 0],
            vec![2, 1, 0, 1000, 500, 200, 100, 300],
            vec![3, 1, 1, 1001, 501, 0, 101, 301],
        ]
    );
}

fn mem_history(lake: &Lake, folders: &[RunFolder], data_amount: usize, data_length: usize) -> MemoryHistory {
    let mut mem = MemoryHistory::new("mem", data_amount, data_length).unwrap();
    mem.postprocess(
        &ArtifactLayout::new(lake.path()),
        &GaugePrefixes::default(),
        folders,
        TEST_NAME,
        MEM_KEY,
        PROCESS,
    )
    .unwrap();
    mem
}

#[test]
fn memory_legacy_layout_zips_by_position_despite_timestamps() {
    let lake = Lake::new();
    let folder = lake.folder(3);
    lake.write_collectd(3, false, "size", &["1000", "1001", "1002"]);
    lake.write_collectd(3, false, "resident", &["500", "501", "502"]);
    // one tick late
    lake.write_collectd_from(3, false, "shared", 1650000001, &["200", "201", "202"]);
    lake.write_collectd(3, false, "text", &["100", "101", "102"]);
    lake.write_collectd(3, false, "data", &["300", "301", "302"]);
    let mem = mem_history(&lake, &[folder], 1, 4);
    let rows: Vec<Vec<i64>> = mem.table().rows().map(|row| row.to_vec()).collect();
    assert_eq!(
        rows,
        vec![
            vec![0, 0, 0, 1000, 500, 200, 100, 300],
            vec![1, 0, 1, 1001, 501, 201, 101, 301],
            vec![2, 0, 2, 1002, 502, 202, 102, 302],
            vec![3, 0, 3, 0, 0, 0, 0, 0],
        ]
    );
    assert!(matches!(
        mem.sources()[0],
        RunSource::Collectd {
            layout: CollectdLayout::Legacy,
            ..
        }
    ));
}

#[test]
fn memory_missing_counter_file_means_no_samples() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    lake.write_collectd(1, true, "size", &["1000", "1001"]);
    lake.write_collectd(1, true, "resident", &["500", "501"]);
    lake.write_collectd(1, true, "shared", &["200", "201"]);
    lake.write_collectd(1, true, "text", &["100", "101"]);
    let mem = mem_history(&lake, &[folder], 1, 2);
    let rows: Vec<Vec<i64>> = mem.table().rows().map(|row| row.to_vec()).collect();
    assert_eq!(
        rows,
        vec![vec![0, 0, 0, 0, 0, 0, 0, 0], vec![1, 0, 1, 0, 0, 0, 0, 0]]
    );
}

#[test]
fn blocks_beyond_the_last_folder_are_keyed() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    lake.write_primary(1, CPU_KEY, &[stat_line(PROCESS, 5, 6)]);
    let cpu = cpu_history(&lake, &[folder], 3, 2);
    assert_eq!(
        rows(&cpu),
        vec![
            vec![0, 0, 0, 5, 6, 0, 0],
            vec![1, 0, 1, 0, 0, 0, 0],
            vec![2, 1, 0, 0, 0, 0, 0],
            vec![3, 1, 1, 0, 0, 0, 0],
            vec![4, 2, 0, 0, 0, 0, 0],
            vec![5, 2, 1, 0, 0, 0, 0],
        ]
    );
    let ids: Vec<Value> = cpu.export().records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, (0..6).map(Value::from).collect::<Vec<_>>());
}

#[test]
fn non_utf8_line_in_primary_dump_is_skipped() {
    let lake = Lake::new();
    let folder = lake.folder(1);
    let path = lake.write_primary(1, CPU_KEY, &[stat_line(PROCESS, 3, 4)]);
    let mut contents = std::fs::read(&path).unwrap();
    contents.extend_from_slice(b"4243 (\xff\xfe) S 0 0\n");
    contents.extend_from_slice(stat_line(PROCESS, 5, 6).as_bytes());
    contents.push(b'\n');
    std::fs::write(&path, contents).unwrap();
    let cpu = cpu_history(&lake, &[folder], 1, 3);
    assert_eq!(
        rows(&cpu),
        vec![
            vec![0, 0, 0, 3, 4, 0, 0],
            vec![1, 0, 1, 5, 6, 0, 0],
            vec![2, 0, 2, 0, 0, 0, 0],
        ]
    );
}

#[test]
fn export_is_in_row_order_with_integers() {
    let lake = Lake::new();
    let folders = vec![lake.folder(1), lake.folder(2)];
    lake.write_primary(2, CPU_KEY, &[stat_line(PROCESS, 8, 9)]);
    let cpu = cpu_history(&lake, &folders, 2, 2);
    let export = cpu.export();
    assert_eq!(export.records.len(), 4);
    for (i, record) in export.records.iter().enumerate() {
        assert_eq!(record["id"], Value::from(i as i64));
        assert!(record.values().all(|v| v.is_i64()));
    }
    assert_eq!(export.records[2]["utime"], Value::from(8));
    assert_eq!(export.records[2]["mid"], Value::from(1));
}
