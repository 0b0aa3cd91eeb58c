//! Presenting tables to humans: on the terminal, or as a workbook.

pub mod excel;
pub mod terminal_table;
