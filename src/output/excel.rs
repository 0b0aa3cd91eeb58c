//! Writing exported tables into an Excel workbook, one worksheet per
//! table.

use std::{ffi::OsString, path::Path};

use anyhow::{anyhow, Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use serde_json::Value;

use crate::schema::Export;

/// Added to the automatic column width calculation to avoid widths
/// too small for the strings in the cells.
const WIDTH_SAFETY_MARGIN_CHARS: f64 = 2.0;

/// Excel's limit on worksheet names
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Worksheet names may not contain some characters and are limited in
/// length.
pub fn sheet_name(table_name: &str) -> String {
    table_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect()
}

fn colnum(i: usize) -> Result<u16> {
    u16::try_from(i).with_context(|| anyhow!("too many columns for excel"))
}

/// Write `tables` (name and content) into `file`, via a temporary
/// file that is renamed into place.
pub fn excel_file_write<'t>(
    tables: impl IntoIterator<Item = (&'t str, &'t Export)>,
    file: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    for (table_name, export) in tables {
        let worksheet = workbook.add_worksheet();
        let name = sheet_name(table_name);
        worksheet
            .set_name(&name)
            .with_context(|| anyhow!("trying to use table name as worksheet name: {name:?}"))?;

        let mut column_widths: Vec<usize> = export.schema.names().map(|n| n.len()).collect();

        let title_format = Format::new().set_bold();
        for (i, title) in export.schema.names().enumerate() {
            worksheet
                .write_with_format(0, colnum(i)?, title, &title_format)
                .with_context(|| anyhow!("write title value {title:?}"))?;
        }

        let number_format = Format::new().set_align(FormatAlign::Right);
        for (rownum, record) in (1..).zip(&export.records) {
            for (i, name) in export.schema.names().enumerate() {
                let col = colnum(i)?;
                match record.get(name) {
                    Some(Value::Number(n)) => {
                        let s = n.to_string();
                        column_widths[i] = column_widths[i].max(s.len());
                        let v = n
                            .as_f64()
                            .ok_or_else(|| anyhow!("number {n} not representable"))?;
                        worksheet
                            .write_number_with_format(rownum, col, v, &number_format)
                            .with_context(|| anyhow!("write value {n}"))?;
                    }
                    Some(Value::String(s)) => {
                        column_widths[i] = column_widths[i].max(s.chars().count());
                        worksheet
                            .write_string(rownum, col, s)
                            .with_context(|| anyhow!("write value {s:?}"))?;
                    }
                    Some(Value::Null) | None => (),
                    Some(v) => {
                        let s = v.to_string();
                        column_widths[i] = column_widths[i].max(s.chars().count());
                        worksheet
                            .write_string(rownum, col, &s)
                            .with_context(|| anyhow!("write value {s:?}"))?;
                    }
                }
            }
        }

        // worksheet.autofit() gives bad results for numbers in
        // LibreOffice, count characters ourselves
        for (i, num_chars) in column_widths.iter().enumerate() {
            let col = colnum(i)?;
            let width = *num_chars as f64 + WIDTH_SAFETY_MARGIN_CHARS;
            worksheet
                .set_column_width(col, width)
                .with_context(|| anyhow!("setting column width on column {col} to {width}"))?;
        }
    }

    let file_name = file
        .file_name()
        .ok_or_else(|| anyhow!("path misses a filename: {file:?}"))?;
    let mut tmp_name: OsString = file_name.to_owned();
    tmp_name.push(".tmp");
    let file_tmp = file.with_file_name(tmp_name);
    workbook
        .save(&file_tmp)
        .with_context(|| anyhow!("saving to file {file_tmp:?}"))?;
    std::fs::rename(&file_tmp, file)
        .with_context(|| anyhow!("renaming {file_tmp:?} to {file:?}"))?;

    Ok(())
}
