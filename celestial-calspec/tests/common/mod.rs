#![allow(dead_code)]

use std::path::{Path, PathBuf};

const CARD: usize = 80;
const BLOCK: usize = 2880;

fn push_card(bytes: &mut Vec<u8>, text: &str) {
    let mut card = text.as_bytes().to_vec();
    card.resize(CARD, b' ');
    bytes.extend(card);
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(BLOCK) * BLOCK;
    bytes.resize(len, fill);
}

/// A FITS file laid out like an archive spectrum: empty primary HDU, then a
/// binary table with WAVELENGTH, FLUX, STATERROR and SYSERROR as doubles.
pub fn spectrum_fits(wavelength: &[f64], flux: &[f64], flux_unit: &str) -> Vec<u8> {
    assert_eq!(wavelength.len(), flux.len());

    let mut bytes = Vec::new();
    push_card(&mut bytes, "SIMPLE  =                    T");
    push_card(&mut bytes, "BITPIX  =                    8");
    push_card(&mut bytes, "NAXIS   =                    0");
    push_card(&mut bytes, "END");
    pad(&mut bytes, b' ');

    let columns = [
        ("WAVELENGTH", "ANGSTROMS"),
        ("FLUX", flux_unit),
        ("STATERROR", flux_unit),
        ("SYSERROR", flux_unit),
    ];
    push_card(&mut bytes, "XTENSION= 'BINTABLE'");
    push_card(&mut bytes, "BITPIX  =                    8");
    push_card(&mut bytes, "NAXIS   =                    2");
    push_card(&mut bytes, &format!("NAXIS1  = {:>20}", 8 * columns.len()));
    push_card(&mut bytes, &format!("NAXIS2  = {:>20}", wavelength.len()));
    push_card(&mut bytes, "PCOUNT  =                    0");
    push_card(&mut bytes, "GCOUNT  =                    1");
    push_card(&mut bytes, &format!("TFIELDS = {:>20}", columns.len()));
    for (i, (name, unit)) in columns.iter().enumerate() {
        let n = i + 1;
        push_card(&mut bytes, &format!("TTYPE{:<3}= '{}'", n, name));
        push_card(&mut bytes, &format!("TFORM{:<3}= '1D      '", n));
        push_card(&mut bytes, &format!("TUNIT{:<3}= '{}'", n, unit));
    }
    push_card(&mut bytes, "END");
    pad(&mut bytes, b' ');

    let mut data = Vec::new();
    for (w, f) in wavelength.iter().zip(flux) {
        for value in [*w, *f, f * 0.02, f * 0.01] {
            data.extend(value.to_be_bytes());
        }
    }
    pad(&mut data, 0);
    bytes.extend(data);
    bytes
}

pub fn write_spectrum(dir: &Path, filename: &str, wavelength: &[f64], flux: &[f64]) -> PathBuf {
    let path = dir.join(filename);
    std::fs::write(&path, spectrum_fits(wavelength, flux, "FLAM")).unwrap();
    path
}

pub const TABLE_HEADER: &str =
    "Star_name,Alt_Star_name,Simbad_Name,Astroquery_Name,Name,STIS,Model,RA,Decl,PM_RA,PM_Dec,SpType,V,B_V";

/// Write a lookup table CSV made of `rows` under the standard header.
pub fn write_table(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("calspec.csv");
    let mut contents = String::from(TABLE_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    std::fs::write(&path, contents).unwrap();
    path
}
