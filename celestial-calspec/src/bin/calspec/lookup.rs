use crate::cli::{Cli, InfoArgs, ListArgs, NameArgs};
use anyhow::{bail, Context, Result};
use celestial_calspec::{CatalogRow, LookupTable, SpectrumCache, SpectrumKind};

fn load_table(cli: &Cli) -> Result<LookupTable> {
    cli.config()
        .load_table()
        .context("Failed to load CALSPEC lookup table")
}

pub fn check(args: &NameArgs, cli: &Cli) -> Result<()> {
    let table = load_table(cli)?;
    if !table.has_entry(&args.name) {
        bail!("'{}' is not a CALSPEC star", args.name);
    }
    let entry = table.resolve(&args.name)?;
    println!("{}", entry.star_name());
    Ok(())
}

pub fn info(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let config = cli.config();
    let table = load_table(cli)?;
    let cache = SpectrumCache::new(&config)?;
    let row = table.resolve(&args.name)?.row();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&row_json(row, &cache))?);
        return Ok(());
    }

    println!("Star:            {}", row.star_name);
    print_optional("Alternate name:", &row.alt_star_name);
    print_optional("Simbad name:", &row.simbad_name);
    print_optional("Astroquery name:", &row.astroquery_name);
    print_optional("RA:", &row.ra);
    print_optional("Dec:", &row.dec);
    if let (Some(pm_ra), Some(pm_dec)) = (row.pm_ra, row.pm_dec) {
        println!("{:<16} {} {} mas/yr", "Proper motion:", pm_ra, pm_dec);
    }
    print_optional("Spectral type:", &row.sp_type);
    if let Some(v) = row.v_mag {
        println!("{:<16} {}", "V:", v);
    }
    if let Some(b_v) = row.b_v {
        println!("{:<16} {}", "B-V:", b_v);
    }
    for kind in SpectrumKind::PREFERENCE {
        let label = format!("{} file:", kind);
        match row.spectrum_filename(kind) {
            Some(filename) => {
                let cached = if cache.is_cached(row, kind) { "cached" } else { "not cached" };
                println!("{:<16} {} ({})", label, filename, cached);
            }
            None => println!("{:<16} -", label),
        }
    }
    Ok(())
}

fn print_optional(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{:<16} {}", label, value);
    }
}

fn row_json(row: &CatalogRow, cache: &SpectrumCache) -> serde_json::Value {
    let spectra: Vec<serde_json::Value> = SpectrumKind::PREFERENCE
        .into_iter()
        .filter_map(|kind| {
            let filename = row.spectrum_filename(kind)?;
            Some(serde_json::json!({
                "kind": kind.as_str(),
                "filename": filename,
                "url": cache.remote_url(&filename),
                "cached": cache.is_cached(row, kind),
            }))
        })
        .collect();

    serde_json::json!({
        "star_name": row.star_name,
        "alt_star_name": row.alt_star_name,
        "simbad_name": row.simbad_name,
        "astroquery_name": row.astroquery_name,
        "file_stem": row.file_stem,
        "ra": row.ra,
        "dec": row.dec,
        "pm_ra": row.pm_ra,
        "pm_dec": row.pm_dec,
        "sp_type": row.sp_type,
        "v": row.v_mag,
        "b_v": row.b_v,
        "spectra": spectra,
    })
}

pub fn list(args: &ListArgs, cli: &Cli) -> Result<()> {
    let table = load_table(cli)?;

    if args.csv {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer.write_record(["Star_name", "Name", "STIS", "Model"])?;
        for row in table.rows() {
            writer.write_record([&row.star_name, &row.file_stem, &row.stis, &row.model])?;
        }
        writer.flush()?;
        return Ok(());
    }

    println!("{:<20} {:<16} {:<18} {:<10}", "STAR", "STEM", "STIS", "MODEL");
    for row in table.rows() {
        println!(
            "{:<20} {:<16} {:<18} {:<10}",
            row.star_name,
            row.file_stem,
            or_dash(&row.stis),
            or_dash(&row.model)
        );
    }
    println!("{} stars", table.len());
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
