use crate::cache::{fetch_path, open};
use crate::cli::{Cli, OutputFormat, SpectrumArgs};
use anyhow::Result;
use celestial_calspec::{spectrum, SpectrumTable};
use std::io::{self, Write};

pub fn run(args: &SpectrumArgs, cli: &Cli) -> Result<()> {
    let calspec = open(cli)?;
    let path = fetch_path(&calspec, &args.fetch)?;
    let table = spectrum::load(&path)?;
    let rows = args.limit.unwrap_or(table.len()).min(table.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Table => write_table(&mut out, &table, rows)?,
        OutputFormat::Csv => write_csv(&mut out, &table, rows)?,
        OutputFormat::Json => write_json(&mut out, &table, rows)?,
    }
    out.flush()?;
    Ok(())
}

fn write_table(out: &mut impl Write, table: &SpectrumTable, rows: usize) -> Result<()> {
    let columns = table.columns();
    for column in columns {
        write!(out, "{:>24}", column.name)?;
    }
    writeln!(out)?;
    for column in columns {
        write!(out, "{:>24}", format!("[{}]", column.unit))?;
    }
    writeln!(out)?;

    for row in (0..rows).filter_map(|i| table.row(i)) {
        for value in row {
            write!(out, "{:>24.8e}", value)?;
        }
        writeln!(out)?;
    }
    if rows < table.len() {
        writeln!(out, "... {} more rows", table.len() - rows)?;
    }
    Ok(())
}

fn write_csv(out: &mut impl Write, table: &SpectrumTable, rows: usize) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(
        table
            .columns()
            .map(|c| format!("{} [{}]", c.name, c.unit)),
    )?;
    for row in (0..rows).filter_map(|i| table.row(i)) {
        writer.write_record(row.map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(out: &mut impl Write, table: &SpectrumTable, rows: usize) -> Result<()> {
    let columns: Vec<serde_json::Value> = table
        .columns()
        .into_iter()
        .map(|column| {
            serde_json::json!({
                "name": column.name,
                "unit": column.unit.symbol(),
                "values": &column.values[..rows],
            })
        })
        .collect();

    let document = serde_json::json!({
        "rows": table.len(),
        "columns": columns,
    });
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}
