//! Tabular output in the text formats

use miette::{IntoDiagnostic, Result};
use std::io::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::escape_md;
use crate::cli::OutputFormat;

/// Rows of text under a header line
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a string; JSON/YAML/Auto fall back to TSV
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(self.render_boxed()),
            OutputFormat::Csv => self.render_csv(),
            OutputFormat::Md => Ok(self.render_md()),
            OutputFormat::Tsv | OutputFormat::Auto | OutputFormat::Json | OutputFormat::Yaml => {
                Ok(self.render_tsv())
            }
        }
    }

    pub fn print(&self, format: OutputFormat) -> Result<()> {
        let text = self.render(format)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes()).into_diagnostic()?;
        Ok(())
    }

    fn render_tsv(&self) -> String {
        let clean = |s: &String| s.replace(['\t', '\n'], " ");
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| row.iter().map(clean).collect::<Vec<_>>().join("\t") + "\n")
            .collect()
    }

    fn render_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers).into_diagnostic()?;
        for row in &self.rows {
            writer.write_record(row).into_diagnostic()?;
        }
        let bytes = writer.into_inner().into_diagnostic()?;
        String::from_utf8(bytes).into_diagnostic()
    }

    fn render_md(&self) -> String {
        let line = |cells: &[String]| {
            let cells: Vec<String> = cells.iter().map(|c| escape_md(c)).collect();
            format!("| {} |\n", cells.join(" | "))
        };
        let mut out = line(&self.headers);
        out.push_str(&format!("|{}\n", "---|".repeat(self.headers.len())));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out
    }

    fn render_boxed(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        format!("{}\n", table)
    }
}
