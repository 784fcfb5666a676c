//! Literature half-life and branching database.
//!
//! Nuclide records are keyed by `(Z, N)`. Values arrive either through the
//! insert methods or from CSV tables in the layouts used by the evaluated
//! data exports this toolkit was built around: half-life rows as
//! `N, Z, half-life-or-STABLE, uncertainty`, branching tables with
//! header-addressed `Z` / `A` / `P1n` / `P2n` columns.

use ds_core::math::{halflife_to_decay_constant, SECONDS};
use ds_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Element symbols indexed by Z − 1.
const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Proton number for an element symbol.
pub fn element_z(symbol: &str) -> Option<u32> {
    ELEMENT_SYMBOLS.iter().position(|&s| s == symbol).map(|i| i as u32 + 1)
}

/// Element symbol for a proton number.
pub fn element_symbol(z: u32) -> Option<&'static str> {
    (z >= 1).then(|| ELEMENT_SYMBOLS.get(z as usize - 1).copied()).flatten()
}

/// Half-life record for one nuclide.
#[derive(Debug, Clone, Copy)]
pub struct NuclideRecord {
    /// Half-life in seconds; stable nuclides carry infinity.
    pub halflife: f64,
    /// Half-life uncertainty in seconds.
    pub uncertainty: f64,
}

/// Beta-delayed neutron-emission probabilities for one nuclide.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchingRecord {
    /// One-neutron emission probability.
    pub p_1n: Option<f64>,
    /// Two-neutron emission probability.
    pub p_2n: Option<f64>,
}

/// Literature lookups for half-lives and branching probabilities.
#[derive(Debug, Clone, Default)]
pub struct LiteratureDb {
    nuclides: HashMap<(u32, u32), NuclideRecord>,
    branching: HashMap<(u32, u32), BranchingRecord>,
}

impl LiteratureDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) one nuclide's half-life record.
    pub fn insert_nuclide(&mut self, zn: (u32, u32), record: NuclideRecord) {
        self.nuclides.insert(zn, record);
    }

    /// Insert (or replace) one nuclide's branching record.
    pub fn insert_branching(&mut self, zn: (u32, u32), record: BranchingRecord) {
        self.branching.insert(zn, record);
    }

    /// Parse an isotope label like `Mg36` (or `36Mg`) into `(Z, N)`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for unknown element symbols, missing mass
    /// numbers, or a mass number below the proton number.
    pub fn parse_isotope(isotope: &str) -> Result<(u32, u32)> {
        let symbol: String = isotope.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        let digits: String = isotope.chars().filter(|c| c.is_ascii_digit()).collect();
        if symbol.is_empty() || digits.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "'{isotope}' is not an isotope label (expected e.g. Mg36)"
            )));
        }
        let z = element_z(&symbol)
            .ok_or_else(|| Error::InvalidArgument(format!("'{symbol}' is not an element")))?;
        let mass: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("bad mass number in '{isotope}'")))?;
        if mass < z {
            return Err(Error::InvalidArgument(format!(
                "mass number {mass} below proton number {z} in '{isotope}'"
            )));
        }
        Ok((z, mass - z))
    }

    /// Format `(Z, N)` as an isotope label like `Mg36`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when Z has no known element symbol.
    pub fn isotope_name(zn: (u32, u32)) -> Result<String> {
        let symbol = element_symbol(zn.0)
            .ok_or_else(|| Error::InvalidArgument(format!("no element with Z = {}", zn.0)))?;
        Ok(format!("{symbol}{}", zn.0 + zn.1))
    }

    /// `(Z, N)` of the beta daughter: (Z+1, N−1).
    pub fn beta_daughter(zn: (u32, u32)) -> Result<(u32, u32)> {
        Self::shift(zn, 1)
    }

    /// `(Z, N)` of the beta-1n daughter: (Z+1, N−2).
    pub fn beta_n_daughter(zn: (u32, u32)) -> Result<(u32, u32)> {
        Self::shift(zn, 2)
    }

    /// `(Z, N)` of the beta-2n daughter: (Z+1, N−3).
    pub fn beta_2n_daughter(zn: (u32, u32)) -> Result<(u32, u32)> {
        Self::shift(zn, 3)
    }

    fn shift(zn: (u32, u32), neutrons_removed: u32) -> Result<(u32, u32)> {
        if zn.1 < neutrons_removed {
            return Err(Error::InvalidArgument(format!(
                "nuclide (Z={}, N={}) has fewer than {neutrons_removed} neutrons",
                zn.0, zn.1
            )));
        }
        Ok((zn.0 + 1, zn.1 - neutrons_removed))
    }

    fn nuclide(&self, isotope: &str) -> Result<&NuclideRecord> {
        let zn = Self::parse_isotope(isotope)?;
        self.nuclides.get(&zn).ok_or_else(|| {
            Error::KeyNotFound(format!("isotope {isotope} (Z={}, N={}) has no half-life record", zn.0, zn.1))
        })
    }

    /// Half-life in seconds (infinite for stable nuclides).
    pub fn halflife(&self, isotope: &str) -> Result<f64> {
        Ok(self.nuclide(isotope)?.halflife)
    }

    /// Half-life uncertainty in seconds.
    pub fn halflife_uncertainty(&self, isotope: &str) -> Result<f64> {
        Ok(self.nuclide(isotope)?.uncertainty)
    }

    /// Decay constant in 1/s (zero for stable nuclides).
    pub fn decay_constant(&self, isotope: &str) -> Result<f64> {
        Ok(halflife_to_decay_constant(self.halflife(isotope)?, SECONDS, SECONDS))
    }

    /// Beta-delayed `neutrons`-neutron emission probability (1 or 2).
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a neutron count other than 1 or 2;
    /// [`Error::KeyNotFound`] when the nuclide or the requested probability
    /// is absent.
    pub fn pn(&self, isotope: &str, neutrons: u8) -> Result<f64> {
        let zn = Self::parse_isotope(isotope)?;
        let record = self.branching.get(&zn).ok_or_else(|| {
            Error::KeyNotFound(format!("isotope {isotope} has no branching record"))
        })?;
        let value = match neutrons {
            1 => record.p_1n,
            2 => record.p_2n,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "branching is tabulated for 1 or 2 neutrons, not {other}"
                )))
            }
        };
        value.ok_or_else(|| {
            Error::KeyNotFound(format!("isotope {isotope} has no P{neutrons}n value"))
        })
    }

    /// Load half-life rows (`N, Z, half-life-or-STABLE, uncertainty`) from a
    /// headered CSV file. Returns the number of records loaded.
    pub fn load_halflives_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut loaded = 0;
        for row in reader.records() {
            let row = row?;
            if row.len() < 3 || row.get(0).is_some_and(|f| f.starts_with('#')) {
                continue;
            }
            let n: u32 = parse_field(&row, 0)?;
            let z: u32 = parse_field(&row, 1)?;
            let halflife_field = row.get(2).unwrap_or_default();
            let halflife = if halflife_field == "STABLE" {
                f64::INFINITY
            } else {
                halflife_field.parse().map_err(|_| {
                    Error::InvalidArgument(format!("bad half-life '{halflife_field}'"))
                })?
            };
            let uncertainty = match row.get(3) {
                Some("") | None => 0.0,
                _ if halflife.is_infinite() => 0.0,
                Some(field) => field
                    .parse()
                    .map_err(|_| Error::InvalidArgument(format!("bad uncertainty '{field}'")))?,
            };
            self.insert_nuclide((z, n), NuclideRecord { halflife, uncertainty });
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Load a branching table with header-addressed `Z`, `A`, `P1n`, `P2n`
    /// columns; `#`-prefixed rows are comments. Returns the number of
    /// records loaded.
    pub fn load_branching_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader =
            csv::ReaderBuilder::new().has_headers(false).flexible(true).from_path(path)?;
        let mut columns: Option<HashMap<String, usize>> = None;
        let mut loaded = 0;
        for row in reader.records() {
            let row = row?;
            if row.get(0).is_some_and(|f| f.starts_with('#')) {
                continue;
            }
            let cols = match columns.as_ref() {
                Some(cols) => cols,
                None => {
                    let header: HashMap<String, usize> =
                        row.iter().enumerate().map(|(i, f)| (f.trim().to_string(), i)).collect();
                    if !header.contains_key("Z") || !header.contains_key("A") {
                        return Err(Error::InvalidArgument(
                            "branching table header must contain Z and A columns".into(),
                        ));
                    }
                    columns = Some(header);
                    continue;
                }
            };
            let z: u32 = parse_field(&row, cols["Z"])?;
            let a: u32 = parse_field(&row, cols["A"])?;
            if a < z {
                return Err(Error::InvalidArgument(format!("row has A = {a} < Z = {z}")));
            }
            let p_1n = cols.get("P1n").and_then(|&i| row.get(i)).and_then(|f| f.parse().ok());
            let p_2n = cols.get("P2n").and_then(|&i| row.get(i)).and_then(|f| f.parse().ok());
            let entry = self.branching.entry((z, a - z)).or_default();
            if p_1n.is_some() {
                entry.p_1n = p_1n;
            }
            if p_2n.is_some() {
                entry.p_2n = p_2n;
            }
            loaded += 1;
        }
        Ok(loaded)
    }
}

fn parse_field<T: std::str::FromStr>(row: &csv::StringRecord, index: usize) -> Result<T> {
    row.get(index)
        .and_then(|f| f.trim().parse().ok())
        .ok_or_else(|| Error::InvalidArgument(format!("bad or missing field at column {index}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn isotope_parsing() {
        assert_eq!(LiteratureDb::parse_isotope("Mg36").unwrap(), (12, 24));
        assert_eq!(LiteratureDb::parse_isotope("36Mg").unwrap(), (12, 24));
        assert_eq!(LiteratureDb::parse_isotope("H3").unwrap(), (1, 2));
        assert!(LiteratureDb::parse_isotope("Xx12").is_err());
        assert!(LiteratureDb::parse_isotope("Mg").is_err());
        assert!(LiteratureDb::parse_isotope("36").is_err());
        assert!(LiteratureDb::parse_isotope("Mg3").is_err());
    }

    #[test]
    fn isotope_naming_round_trip() {
        let zn = LiteratureDb::parse_isotope("Mg36").unwrap();
        assert_eq!(LiteratureDb::isotope_name(zn).unwrap(), "Mg36");
    }

    #[test]
    fn daughter_chain() {
        let zn = LiteratureDb::parse_isotope("Mg36").unwrap();
        let d = LiteratureDb::beta_daughter(zn).unwrap();
        let nd = LiteratureDb::beta_n_daughter(zn).unwrap();
        let n2d = LiteratureDb::beta_2n_daughter(zn).unwrap();
        assert_eq!(LiteratureDb::isotope_name(d).unwrap(), "Al36");
        assert_eq!(LiteratureDb::isotope_name(nd).unwrap(), "Al35");
        assert_eq!(LiteratureDb::isotope_name(n2d).unwrap(), "Al34");
        assert!(LiteratureDb::beta_2n_daughter((1, 2)).is_err());
    }

    #[test]
    fn lookups() {
        let mut db = LiteratureDb::new();
        db.insert_nuclide((12, 24), NuclideRecord { halflife: 0.09, uncertainty: 0.005 });
        db.insert_branching((12, 24), BranchingRecord { p_1n: Some(0.8), p_2n: Some(0.1) });

        assert_relative_eq!(db.halflife("Mg36").unwrap(), 0.09);
        assert_relative_eq!(db.halflife_uncertainty("Mg36").unwrap(), 0.005);
        assert_relative_eq!(
            db.decay_constant("Mg36").unwrap(),
            std::f64::consts::LN_2 / 0.09,
            max_relative = 1e-12
        );
        assert_relative_eq!(db.pn("Mg36", 1).unwrap(), 0.8);
        assert_relative_eq!(db.pn("Mg36", 2).unwrap(), 0.1);

        assert!(matches!(db.halflife("Al36"), Err(Error::KeyNotFound(_))));
        assert!(matches!(db.pn("Al36", 1), Err(Error::KeyNotFound(_))));
        assert!(matches!(db.pn("Mg36", 3), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn stable_nuclides_decay_at_rate_zero() {
        let mut db = LiteratureDb::new();
        db.insert_nuclide((12, 12), NuclideRecord { halflife: f64::INFINITY, uncertainty: 0.0 });
        assert_eq!(db.decay_constant("Mg24").unwrap(), 0.0);
    }

    #[test]
    fn csv_loading() {
        let dir = std::env::temp_dir().join("ds_chain_literature_test");
        std::fs::create_dir_all(&dir).unwrap();

        let halflives = dir.join("halflives.csv");
        std::fs::write(&halflives, "N,Z,halflife,uncertainty\n24,12,0.09,0.005\n12,12,STABLE,\n")
            .unwrap();
        let branching = dir.join("branching.csv");
        std::fs::write(&branching, "# Möller 2019 export\nZ,A,P1n,P2n\n12,36,0.8,0.1\n").unwrap();

        let mut db = LiteratureDb::new();
        assert_eq!(db.load_halflives_csv(&halflives).unwrap(), 2);
        assert_eq!(db.load_branching_csv(&branching).unwrap(), 1);
        assert_relative_eq!(db.halflife("Mg36").unwrap(), 0.09);
        assert!(db.halflife("Mg24").unwrap().is_infinite());
        assert_relative_eq!(db.pn("Mg36", 2).unwrap(), 0.1);
    }
}
