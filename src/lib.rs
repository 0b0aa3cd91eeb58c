pub mod artifact_layout;
pub mod config;
pub mod config_file;
pub mod export_cycle;
pub mod get_terminal_width;
pub mod measurement;
pub mod output;
pub mod row_table;
pub mod run_folder;
pub mod schema;
pub mod sources;
pub mod store;
pub mod utillib;
