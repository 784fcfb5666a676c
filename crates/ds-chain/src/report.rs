//! Flat-text fit-parameter reports.
//!
//! Best-effort documentation output, not a machine-readable format: the
//! report records the fit quality, every parameter with its error, and the
//! half-life derived from each decay constant. Existing reports are never
//! destroyed — a new write moves the previous file to an auto-incremented
//! backup name first.

use crate::activity::DecayChainModel;
use ds_core::math::{decay_constant_to_halflife, SECONDS};
use ds_core::{Error, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

impl DecayChainModel {
    /// Write the most recent fit's parameter summary under `dir`.
    ///
    /// The file is named `r<radius>parameters.txt`; when it already exists
    /// and `overwrite` is false, the previous contents are preserved as
    /// `r<radius>parameters_old_<n>.txt` with the first unused `n`.
    /// Returns the path written.
    ///
    /// # Errors
    /// [`Error::NotYetFit`] when the model has no stored fit;
    /// [`Error::Io`] for directory-creation and file failures.
    pub fn save_fit_parameters(
        &self,
        isotope: &str,
        num_fit_bins: usize,
        dir: &Path,
        correlation_radius: f64,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let report = self
            .last_fit()
            .ok_or_else(|| Error::NotYetFit(format!("{} has no stored fit result", self.name())))?;
        fs::create_dir_all(dir)?;

        let (fit_low, fit_high) = self.fit_range();
        let tu = self.time_units();
        let n_free = self.params().iter().filter(|p| !p.fixed).count();
        let dof = num_fit_bins as i64 - n_free as i64;

        let mut out = format!("{isotope}, correlation radius: {correlation_radius}\n");
        let _ = writeln!(out, "\tfit_low (s): {}, fit_high (s): {}", fit_low * tu, fit_high * tu);
        let _ = writeln!(out, "\tChisquare: {:.3E}", report.chi2);
        let _ = writeln!(out, "\tFree Parameters: {n_free}");
        let _ = writeln!(out, "\tBins in Fit: {num_fit_bins}");
        let _ = writeln!(out, "\tDOF: {dof}");
        let _ = writeln!(
            out,
            "\tChisquare / DOF: {:E}",
            if dof > 0 { report.chi2 / dof as f64 } else { -1.0 }
        );

        for param in self.params() {
            let error_phrase = if param.fixed && param.error == 0.0 {
                "fixed value".to_string()
            } else {
                format!("{:E}", param.error)
            };
            let _ = write!(
                out,
                "\t{}: \n\t\tvalue: {:E}, error: {}",
                param.name, param.value, error_phrase
            );
            if param.name.to_lowercase().contains("lambda") {
                // a fixed decay constant carries no fit error; say so instead
                // of propagating a zero through the half-life
                let halflife = decay_constant_to_halflife(param.value, SECONDS, SECONDS);
                let percent = if param.error > 0.0 && param.value != 0.0 {
                    format!("{:.3}%", param.error / param.value * 100.0)
                } else {
                    "fixed value".to_string()
                };
                let absolute = if param.error > 0.0 && param.value != 0.0 {
                    format!("{:E}", param.error / param.value * halflife)
                } else {
                    "fixed value".to_string()
                };
                let _ = write!(
                    out,
                    "\n\t\tT1/2 (s): {halflife:E}, Percent Relative Error: {percent}, Relative Error: {absolute}"
                );
            }
            out.push('\n');
        }
        let _ = writeln!(out, "Most Recent Fit Result:");
        let _ = writeln!(out, "{report}");

        let file = dir.join(format!("r{correlation_radius:.3}parameters.txt"));
        if file.exists() && !overwrite {
            let mut copy = 0usize;
            let backup = loop {
                let candidate =
                    dir.join(format!("r{correlation_radius:.3}parameters_old_{copy}.txt"));
                if !candidate.exists() {
                    break candidate;
                }
                copy += 1;
            };
            fs::copy(&file, &backup)?;
        }
        fs::write(&file, out)?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use crate::activity::{ChainSpec, DecayChainModel, HalflifeGuess};
    use ds_core::{CurveModel, Error};
    use ds_fit::{FitOptions, Histogram};

    fn fitted_model() -> (DecayChainModel, usize) {
        let spec = ChainSpec {
            name: "Mg36".into(),
            fit_name: "mg36_fit".into(),
            halflife_names: [
                "lambda_beta^Mg36".into(),
                "lambda_beta^Al36".into(),
                "lambda_beta^Al35".into(),
                "lambda_beta^Al34".into(),
            ],
            halflife_info: [
                HalflifeGuess::floating(7.0),
                HalflifeGuess::fixed(7.7),
                HalflifeGuess::fixed(18.0),
                HalflifeGuess::fixed(16.0),
            ],
            a0_start: 900.0,
            background: 4.0,
            fit_low: -1e7,
            fit_high: 1e8,
            ..ChainSpec::default()
        };
        let truth = DecayChainModel::new(spec.clone());
        let mut truth_params = truth.parameter_init();
        truth_params[0] = 1000.0;
        truth_params[4] = 7.7;
        let hist =
            Histogram::from_model("decay", 110, -1e7, 1e8, &truth, &truth_params).unwrap();
        let mut model = DecayChainModel::new(spec);
        model.fit(&hist, &FitOptions::default(), None).unwrap();
        (model, 110)
    }

    #[test]
    fn report_requires_a_fit() {
        let model = DecayChainModel::new(ChainSpec::default());
        let dir = std::env::temp_dir().join("ds_chain_report_unfit");
        let err = model.save_fit_parameters("X", 10, &dir, 0.5, false).unwrap_err();
        assert!(matches!(err, Error::NotYetFit(_)));
    }

    #[test]
    fn report_contents_and_backup_rotation() {
        let (model, bins) = fitted_model();
        let dir = std::env::temp_dir().join("ds_chain_report_test");
        let _ = std::fs::remove_dir_all(&dir);

        let path = model.save_fit_parameters("Mg36", bins, &dir, 0.5, false).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Mg36, correlation radius: 0.5"));
        assert!(text.contains("Chisquare:"));
        assert!(text.contains("lambda_beta^Mg36"));
        assert!(text.contains("T1/2 (s):"));
        // fixed daughters report no fit error
        assert!(text.contains("fixed value"));
        assert!(text.contains("Most Recent Fit Result:"));

        // a second write without overwrite preserves the first under _old_0
        model.save_fit_parameters("Mg36", bins, &dir, 0.5, false).unwrap();
        assert!(dir.join("r0.500parameters_old_0.txt").exists());
        model.save_fit_parameters("Mg36", bins, &dir, 0.5, false).unwrap();
        assert!(dir.join("r0.500parameters_old_1.txt").exists());

        // overwrite skips the backup
        model.save_fit_parameters("Mg36", bins, &dir, 0.5, true).unwrap();
        assert!(!dir.join("r0.500parameters_old_2.txt").exists());
    }
}
