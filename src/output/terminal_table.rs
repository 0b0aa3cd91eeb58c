//! Printing tables to a terminal, either human-readable (padded
//! with spaces, titles styled with ANSI sequences) or as TSV.

//! Does not escape anything in the fields. Our cells are numbers,
//! dates, URLs and branch names, none of which contain tabs or
//! newlines.

use std::{
    fmt::Display,
    io::{BufWriter, Write},
};

use anyhow::{anyhow, bail, Result};
use strum_macros::EnumString;
use yansi::{Paint, Style};

use crate::schema::Export;

#[derive(Debug, EnumString, PartialEq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum ColorOpt {
    Auto,
    Always,
    Never,
}

impl ColorOpt {
    pub fn want_color(self, detected_terminal: bool) -> bool {
        match self {
            ColorOpt::Auto => detected_terminal,
            ColorOpt::Always => true,
            ColorOpt::Never => false,
        }
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct TerminalTableOpts {
    /// Show the tables as CSV (with '\t' as separator) instead of
    /// human-readable
    #[clap(long)]
    pub tsv: bool,

    /// Whether to use ANSI codes to format human-readable output on
    /// terminals (auto, always, never)
    #[clap(long, default_value = "auto")]
    pub color: ColorOpt,
}

impl Default for TerminalTableOpts {
    fn default() -> Self {
        Self {
            tsv: false,
            color: ColorOpt::Auto,
        }
    }
}

impl TerminalTableOpts {
    pub fn want_color(&self, detected_terminal: bool) -> bool {
        let Self { tsv, color } = self;
        if *tsv {
            false
        } else {
            color.want_color(detected_terminal)
        }
    }
}

/// Column widths need to be known before the first row is
/// written. If a value is wider than its column, a single space is
/// still printed after it. The last column gets no padding.
pub struct TerminalTable<O: Write> {
    opts: TerminalTableOpts,
    widths: Vec<usize>,
    titles: Vec<String>,
    padding: String,
    is_terminal: bool,
    out: BufWriter<O>,
}

impl<O: Write> TerminalTable<O> {
    /// The length of `widths` must be one less than that of `titles`
    /// (the last column does not need a width). `is_terminal` is
    /// whether `out` goes to a terminal, for `ColorOpt::Auto`.
    pub fn new<S: Display>(
        widths: &[usize],
        titles: &[S],
        opts: TerminalTableOpts,
        out: O,
        is_terminal: bool,
    ) -> Result<Self> {
        if widths.len() + 1 != titles.len() {
            bail!(
                "need one width less than titles, got {} widths and {} titles",
                widths.len(),
                titles.len()
            )
        }
        let titles = titles.iter().map(|title| title.to_string()).collect();
        let max_width = widths.iter().max().copied().unwrap_or(0);
        let padding = " ".repeat(max_width + 1);
        Ok(Self {
            opts,
            widths: widths.to_owned(),
            titles,
            padding,
            is_terminal,
            out: BufWriter::new(out),
        })
    }

    fn write_row<V: Display>(&mut self, row: &[V], line_style: Option<Style>) -> Result<()> {
        let lens = (self.widths.len(), row.len());
        let (l1, l2) = lens;
        if l1
            != l2
                .checked_sub(1)
                .ok_or_else(|| anyhow!("need at least 1 column"))?
        {
            bail!("widths.len != data.len - 1: {lens:?}")
        }

        for (i, val) in row.iter().enumerate() {
            if self.opts.tsv && i > 0 {
                self.out.write_all(b"\t")?;
            }
            let mut text = val.to_string();
            if let Some(style) = line_style {
                // make sure italic text is not clipped on terminals
                text.push(' ');
                self.out.write_all(text.as_str().paint(style).to_string().as_bytes())?;
            } else {
                self.out.write_all(text.as_bytes())?;
            }
            if let Some(width) = self.widths.get(i) {
                if !self.opts.tsv {
                    let padding_len = width.saturating_sub(text.len()).max(1);
                    let padding_len = padding_len.min(self.padding.len());
                    self.out.write_all(self.padding[0..padding_len].as_bytes())?;
                }
            }
        }
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&mut self) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        let style = if self.opts.want_color(self.is_terminal) {
            Some(STYLE)
        } else {
            None
        };
        let titles = std::mem::take(&mut self.titles);
        let r = self.write_row(&titles, style);
        self.titles = titles;
        r
    }

    pub fn write_data_row<V: Display>(&mut self, data: &[V]) -> Result<()> {
        self.write_row(data, None)
    }

    pub fn print(&mut self, s: &str) -> Result<()> {
        self.out.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn finish(self) -> Result<O> {
        self.out
            .into_inner()
            .map_err(|e| anyhow!("flushing the buffer: {}", e.error()))
    }
}

/// Cells of an exported table as strings, in schema order.
pub fn export_cells(export: &Export) -> Vec<Vec<String>> {
    export
        .records
        .iter()
        .map(|record| {
            export
                .schema
                .names()
                .map(|name| match record.get(name) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                    None => String::new(),
                })
                .collect()
        })
        .collect()
}

/// Print `export` with a heading line, columns sized to fit.
pub fn write_export<O: Write>(
    table_name: &str,
    export: &Export,
    opts: TerminalTableOpts,
    out: O,
    is_terminal: bool,
) -> Result<O> {
    let titles: Vec<&str> = export.schema.names().collect();
    let cells = export_cells(export);
    let mut widths: Vec<usize> = titles.iter().map(|t| t.len() + 2).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len() + 1);
        }
    }
    widths.pop();
    let tsv = opts.tsv;
    let mut table = TerminalTable::new(&widths, &titles, opts, out, is_terminal)?;
    if !tsv {
        table.print(&format!("Content of table {table_name}\n"))?;
    }
    table.write_title_row()?;
    for row in &cells {
        table.write_data_row(row)?;
    }
    if !tsv {
        table.print("\n")?;
    }
    table.finish()
}
