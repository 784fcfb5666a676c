//! Gamma and beta intensity bookkeeping for one isotope.
//!
//! Absolute gamma intensity is the fraction of mother decays producing a
//! line, `Iγ = counts / (ε(E) · N_mother)`; beta-feeding intensity of a
//! state is the gamma balance `Iβ = Σ feeding Iγ − Σ draining Iγ`. Every
//! derived value carries a quadrature-propagated uncertainty.

use crate::efficiency::{fallback_efficiency, CountMode, DetectorConfig, EfficiencyTable};
use ds_core::math::add_errors_in_quadrature;
use ds_core::{Error, Result};
use std::fmt;
use std::fmt::Write as _;

/// A literature intensity: the numeric part (when known) plus the original
/// annotated string for display.
///
/// Annotations survive verbatim — `<5.1` stays `<5.1` in tables — while the
/// numeric part feeds comparisons, with unknown values contributing 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LitValue {
    numeric: Option<f64>,
    display: String,
}

impl LitValue {
    /// A known numeric literature value.
    pub fn known(value: f64) -> Self {
        Self { numeric: Some(value), display: format!("{value}") }
    }

    /// An unknown literature value, displayed as `?`.
    pub fn unknown() -> Self {
        Self { numeric: None, display: "?".into() }
    }

    /// Parse an annotated literature string: `<` / `>` prefixes are kept
    /// for display but stripped for the numeric part; `?` means unknown.
    pub fn parse(text: &str) -> Self {
        let display = text.trim().to_string();
        let stripped = display.trim_start_matches(['<', '>']).trim();
        let numeric = if stripped == "?" || stripped.is_empty() {
            None
        } else {
            stripped.parse().ok()
        };
        Self { numeric, display }
    }

    /// Numeric value with unknowns coerced to the 0 sentinel.
    pub fn numeric(&self) -> f64 {
        self.numeric.unwrap_or(0.0)
    }

    /// True when a numeric value is known.
    pub fn is_known(&self) -> bool {
        self.numeric.is_some()
    }

    /// The display string.
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl From<f64> for LitValue {
    fn from(value: f64) -> Self {
        Self::known(value)
    }
}

impl From<&str> for LitValue {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl fmt::Display for LitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[derive(Debug, Clone)]
struct Level {
    peak: f64,
    counts: f64,
    error: f64,
    literature: LitValue,
    fwhm: f64,
}

/// Absolute gamma intensity of one line.
#[derive(Debug, Clone)]
pub struct GammaIntensity<K> {
    /// Line key.
    pub key: K,
    /// Peak energy (keV).
    pub peak: f64,
    /// Intensity as a fraction of mother decays.
    pub value: f64,
    /// Absolute uncertainty on the intensity.
    pub error: f64,
}

/// Gamma intensity of one line relative to a reference line, percent scale.
#[derive(Debug, Clone)]
pub struct RelativeIntensity<K> {
    /// Line key.
    pub key: K,
    /// Peak energy (keV).
    pub peak: f64,
    /// Relative intensity in percent; exactly 100 for the reference line.
    pub percent: f64,
    /// Uncertainty, percent scale.
    pub percent_error: f64,
    /// Literature relative intensity in percent; 0 when unknown.
    pub literature_percent: f64,
}

/// One excited state's gamma balance: the transitions feeding it and the
/// transitions draining it.
#[derive(Debug, Clone)]
pub struct BetaLevel<K> {
    /// Key of the line depopulating the state (names the state).
    pub level: K,
    /// Keys of lines feeding the state from above.
    pub feeding: Vec<K>,
    /// Keys of lines draining the state.
    pub draining: Vec<K>,
    /// Literature beta-feeding intensity.
    pub literature: LitValue,
}

/// Beta-feeding intensity of one state.
#[derive(Debug, Clone)]
pub struct BetaIntensity<K> {
    /// State key.
    pub key: K,
    /// Peak energy of the state's line (keV).
    pub peak: f64,
    /// Feeding intensity as a fraction of mother decays.
    pub value: f64,
    /// Absolute uncertainty.
    pub error: f64,
    /// Literature value carried from the scheme.
    pub literature: LitValue,
}

/// One isotope's gamma/beta intensity table.
///
/// Append-only during setup, query-only afterwards. The efficiency table is
/// borrowed for the scheme's lifetime; there is no hidden global curve
/// state.
#[derive(Debug, Clone)]
pub struct IntensityScheme<'e, K> {
    isotope: String,
    mother_decays: f64,
    mother_decays_err: f64,
    radius: String,
    tmax: f64,
    table: &'e EfficiencyTable,
    curve_isotope: String,
    config: DetectorConfig,
    mode: CountMode,
    use_per_isotope: bool,
    levels: Vec<(K, Level)>,
}

impl<'e, K: PartialEq + Clone + fmt::Debug> IntensityScheme<'e, K> {
    /// Create a scheme for `isotope` normalized to `mother_decays` total
    /// decays. `radius` and `tmax` describe the correlation cuts behind the
    /// numbers and appear in rendered tables only.
    pub fn new(
        isotope: impl Into<String>,
        mother_decays: f64,
        mother_decays_err: f64,
        radius: impl Into<String>,
        tmax: f64,
        table: &'e EfficiencyTable,
    ) -> Self {
        let isotope = isotope.into();
        Self {
            curve_isotope: isotope.clone(),
            isotope,
            mother_decays,
            mother_decays_err,
            radius: radius.into(),
            tmax,
            table,
            config: DetectorConfig::default(),
            mode: CountMode::default(),
            use_per_isotope: true,
            levels: Vec::new(),
        }
    }

    /// Use another isotope's simulated efficiency curve.
    pub fn with_efficiency_curve(mut self, isotope: impl Into<String>) -> Self {
        self.curve_isotope = isotope.into();
        self
    }

    /// Select the detector configuration for curve lookups.
    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Select addback or singles curves.
    pub fn with_mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip per-isotope curves entirely and use the global fallback.
    pub fn global_efficiency_only(mut self) -> Self {
        self.use_per_isotope = false;
        self
    }

    /// Record one line. Replaces any earlier record under the same key.
    pub fn add_level(
        &mut self,
        key: K,
        peak: f64,
        counts: f64,
        error: f64,
        literature: LitValue,
        fwhm: f64,
    ) {
        let level = Level { peak, counts, error, literature, fwhm };
        if let Some(slot) = self.levels.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = level;
        } else {
            self.levels.push((key, level));
        }
    }

    /// Record several lines: `(key, peak, counts, error, literature, fwhm)`.
    pub fn add_levels(&mut self, levels: Vec<(K, f64, f64, f64, LitValue, f64)>) {
        for (key, peak, counts, error, literature, fwhm) in levels {
            self.add_level(key, peak, counts, error, literature, fwhm);
        }
    }

    fn level(&self, key: &K) -> Result<&Level> {
        self.levels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, level)| level)
            .ok_or_else(|| Error::KeyNotFound(format!("key {key:?} does not exist")))
    }

    /// Recorded keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.levels.iter().map(|(k, _)| k)
    }

    /// Raw counts for a line.
    pub fn counts(&self, key: &K) -> Result<f64> {
        Ok(self.level(key)?.counts)
    }

    /// Count uncertainty for a line.
    pub fn counts_error(&self, key: &K) -> Result<f64> {
        Ok(self.level(key)?.error)
    }

    /// Peak energy for a line.
    pub fn peak(&self, key: &K) -> Result<f64> {
        Ok(self.level(key)?.peak)
    }

    /// FWHM for a line.
    pub fn fwhm(&self, key: &K) -> Result<f64> {
        Ok(self.level(key)?.fwhm)
    }

    /// Literature value for a line.
    pub fn literature(&self, key: &K) -> Result<&LitValue> {
        Ok(&self.level(key)?.literature)
    }

    /// Fractional detection efficiency at `energy`.
    ///
    /// Prefers the per-isotope curve; a missing curve degrades to the
    /// global fallback with a warning, since an approximate efficiency
    /// still beats an aborted analysis.
    fn efficiency_fractional(&self, energy: f64) -> Result<f64> {
        if self.use_per_isotope {
            match self.table.efficiency(energy, &self.curve_isotope, &self.config, self.mode, true)
            {
                Ok(eff) => return Ok(eff),
                Err(err @ Error::NumericGuard(_)) => return Err(err),
                Err(err) => {
                    log::warn!("no per-isotope efficiency ({err}); using the global fallback");
                }
            }
        }
        fallback_efficiency(energy, self.mode, true)
    }

    fn igamma_value(&self, level: &Level) -> Result<f64> {
        Ok(level.counts / (self.efficiency_fractional(level.peak)? * self.mother_decays))
    }

    /// Absolute gamma intensity with propagated uncertainty.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] for an unrecorded key; efficiency guards
    /// propagate.
    pub fn igamma(&self, key: &K) -> Result<GammaIntensity<K>> {
        let level = self.level(key)?;
        let value = self.igamma_value(level)?;
        let frac = add_errors_in_quadrature(&[
            (self.mother_decays, self.mother_decays_err),
            (level.counts, level.error),
        ])?;
        Ok(GammaIntensity { key: key.clone(), peak: level.peak, value, error: frac * value })
    }

    /// Absolute gamma intensities for every recorded line, insertion order.
    pub fn igammas(&self) -> Result<Vec<GammaIntensity<K>>> {
        self.levels.iter().map(|(k, _)| self.igamma(k)).collect()
    }

    /// The most intense line after efficiency correction; ties keep the
    /// first-recorded line. `None` for an empty scheme.
    pub fn most_intense(&self) -> Option<K> {
        let mut best: Option<(&K, f64)> = None;
        for (key, level) in &self.levels {
            let intensity = self.igamma_value(level).unwrap_or(0.0);
            if best.as_ref().map_or(true, |&(_, max)| intensity > max) {
                best = Some((key, intensity));
            }
        }
        best.map(|(k, _)| k.clone())
    }

    /// Gamma intensity relative to a reference line, percent scale.
    ///
    /// The reference defaults to the most intense line and always reports
    /// exactly 100%, whatever the efficiency curve. Other lines report the
    /// counts ratio scaled by the efficiency ratio at the two energies.
    pub fn igamma_relative(&self, key: &K, reference: Option<&K>) -> Result<RelativeIntensity<K>> {
        let refline = match reference {
            Some(r) if self.level(r).is_ok() => r.clone(),
            _ => self
                .most_intense()
                .ok_or_else(|| Error::InvalidArgument("the scheme has no lines".into()))?,
        };
        let level = self.level(key)?;

        if *key == refline {
            let ig = self.igamma(key)?;
            let literature_percent = if level.literature.is_known() { 100.0 } else { 0.0 };
            return Ok(RelativeIntensity {
                key: key.clone(),
                peak: level.peak,
                percent: 100.0,
                percent_error: ig.error * 100.0,
                literature_percent,
            });
        }

        let reference_level = self.level(&refline)?;
        let eff_line = self.efficiency_fractional(level.peak)?;
        let eff_ref = self.efficiency_fractional(reference_level.peak)?;
        let ratio = (level.counts / reference_level.counts) * (eff_ref / eff_line);
        let frac = add_errors_in_quadrature(&[
            (level.counts, level.error),
            (reference_level.counts, reference_level.error),
        ])?;
        let literature_percent = if level.literature.is_known()
            && reference_level.literature.is_known()
            && reference_level.literature.numeric() != 0.0
        {
            100.0 * level.literature.numeric() / reference_level.literature.numeric()
        } else {
            0.0
        };
        Ok(RelativeIntensity {
            key: key.clone(),
            peak: level.peak,
            percent: 100.0 * ratio,
            percent_error: 100.0 * ratio * frac,
            literature_percent,
        })
    }

    /// Relative intensities for every line, reference first.
    pub fn igammas_relative(&self) -> Result<Vec<RelativeIntensity<K>>> {
        let refline = self
            .most_intense()
            .ok_or_else(|| Error::InvalidArgument("the scheme has no lines".into()))?;
        let mut out = vec![self.igamma_relative(&refline, Some(&refline))?];
        for (key, _) in &self.levels {
            if *key == refline {
                continue;
            }
            out.push(self.igamma_relative(key, Some(&refline))?);
        }
        Ok(out)
    }

    /// Measured-minus-literature intensity differences, insertion order.
    pub fn igamma_diffs(&self) -> Result<Vec<(K, f64)>> {
        self.levels
            .iter()
            .map(|(k, level)| Ok((k.clone(), self.igamma_value(level)? - level.literature.numeric())))
            .collect()
    }

    /// Beta-feeding intensity of one state from its gamma balance.
    ///
    /// Every referenced key is validated before any arithmetic, so a typo in
    /// a level scheme fails loudly rather than producing a half-summed
    /// intensity.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] when the state's own line or any feeding or
    /// draining key is unrecorded.
    pub fn i_beta(&self, scheme: &BetaLevel<K>) -> Result<BetaIntensity<K>> {
        let head = self.level(&scheme.level)?;
        for key in scheme.feeding.iter().chain(&scheme.draining) {
            self.level(key)?;
        }

        let mut value = 0.0;
        let mut contributions = Vec::with_capacity(scheme.feeding.len() + scheme.draining.len());
        for key in &scheme.feeding {
            let ig = self.igamma(key)?;
            contributions.push((ig.value, ig.error));
            value += ig.value;
        }
        for key in &scheme.draining {
            let ig = self.igamma(key)?;
            contributions.push((ig.value, ig.error));
            value -= ig.value;
        }
        let error = if contributions.is_empty() {
            0.0
        } else {
            add_errors_in_quadrature(&contributions)? * value
        };
        Ok(BetaIntensity {
            key: scheme.level.clone(),
            peak: head.peak,
            value,
            error,
            literature: scheme.literature.clone(),
        })
    }

    /// Beta-feeding intensities for several states.
    pub fn i_betas(&self, schemes: &[BetaLevel<K>]) -> Result<Vec<BetaIntensity<K>>> {
        schemes.iter().map(|s| self.i_beta(s)).collect()
    }

    fn table_header(&self, what: &str) -> String {
        let mut out = format!(
            "{} {what} for {} mother decays for radius {}, for dT < {}\n",
            self.isotope, self.mother_decays, self.radius, self.tmax
        );
        if self.curve_isotope != self.isotope {
            let _ = writeln!(out, "\tUsing efficiency curve from {}", self.curve_isotope);
        }
        out
    }

    /// Absolute-intensity table as flat text.
    pub fn absolute_table(&self) -> Result<String> {
        let mut out = self.table_header("I_gamma");
        for (key, level) in &self.levels {
            let ig = self.igamma(key)?;
            let _ = writeln!(
                out,
                "\t{:>8.2} keV {:>10.0} cts fwhm={:>6.2} measured {:>7.3}% pm {:>7.3}% literature {}",
                level.peak,
                level.counts,
                level.fwhm,
                ig.value * 100.0,
                ig.error * 100.0,
                level.literature
            );
        }
        Ok(out)
    }

    /// Relative-intensity table as flat text.
    pub fn relative_table(&self, include_fwhm: bool) -> Result<String> {
        let refline = self
            .most_intense()
            .ok_or_else(|| Error::InvalidArgument("the scheme has no lines".into()))?;
        let reference_level = self.level(&refline)?;
        let mut out = self.table_header("I_gamma relative");
        let fwhm_phrase =
            if include_fwhm { format!("fwhm={:>6.2} ", reference_level.fwhm) } else { String::new() };
        let _ = writeln!(
            out,
            "\t{:>6.2} keV {}most intense with literature absolute intensity {}%",
            reference_level.peak, fwhm_phrase, reference_level.literature
        );
        for (key, level) in &self.levels {
            if *key == refline {
                continue;
            }
            let rel = self.igamma_relative(key, Some(&refline))?;
            let fwhm_phrase =
                if include_fwhm { format!("fwhm={:>6.2} ", level.fwhm) } else { String::new() };
            let _ = writeln!(
                out,
                "\t{:>6.2} keV {}measured {:.3}% pm {:.3}% literature intensity {:.2}%",
                rel.peak, fwhm_phrase, rel.percent, rel.percent_error, rel.literature_percent
            );
        }
        Ok(out)
    }

    /// Beta-feeding table as flat text.
    pub fn beta_table(&self, schemes: &[BetaLevel<K>], include_fwhm: bool) -> Result<String> {
        let mut out = self.table_header("I_beta");
        for result in self.i_betas(schemes)? {
            let fwhm_phrase = if include_fwhm {
                format!("fwhm={:>6.2} ", self.fwhm(&result.key)?)
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "\t{:>8.2} keV {}measured {:>6.3}% pm {:>6.3}% literature intensity {}%",
                result.peak,
                fwhm_phrase,
                result.value * 100.0,
                result.error * 100.0,
                result.literature
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_table(percent: f64) -> EfficiencyTable {
        let mut table = EfficiencyTable::new().with_quenching(1.0);
        let flat = [0.0, percent, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        table.insert_curve("Mg36", DetectorConfig::Inside, flat, flat);
        table
    }

    fn scheme(table: &EfficiencyTable) -> IntensityScheme<'_, u32> {
        let mut s = IntensityScheme::new("Mg36", 1_000_000.0, 10_000.0, "0.5", 4.0, table);
        s.add_levels(vec![
            (660, 660.0, 8000.0, 90.0, LitValue::parse("12.5"), 2.1),
            (1460, 1460.0, 2000.0, 45.0, LitValue::parse("<5.1"), 2.4),
            (2610, 2610.0, 500.0, 30.0, LitValue::parse("?"), 2.9),
        ]);
        s
    }

    #[test]
    fn literature_values_keep_annotations() {
        let lt = LitValue::parse("<5.1");
        assert_eq!(lt.display(), "<5.1");
        assert_relative_eq!(lt.numeric(), 5.1);
        assert!(lt.is_known());

        let gt = LitValue::parse("> 12");
        assert_relative_eq!(gt.numeric(), 12.0);

        let unknown = LitValue::parse("?");
        assert_eq!(unknown.numeric(), 0.0);
        assert!(!unknown.is_known());
        assert_eq!(unknown.display(), "?");

        assert_relative_eq!(LitValue::from(3.25).numeric(), 3.25);
    }

    #[test]
    fn absolute_igamma_with_flat_efficiency() {
        // 10% flat efficiency makes the expectation exact:
        // Iγ = 8000 / (0.1 · 1e6) = 0.08
        let table = flat_table(10.0);
        let s = scheme(&table);
        let ig = s.igamma(&660).unwrap();
        assert_relative_eq!(ig.value, 0.08, max_relative = 1e-12);

        let frac = ((10_000.0_f64 / 1_000_000.0).powi(2) + (90.0_f64 / 8000.0).powi(2)).sqrt();
        assert_relative_eq!(ig.error, frac * 0.08, max_relative = 1e-12);

        assert!(matches!(s.igamma(&999), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn missing_curve_falls_back_to_global() {
        // empty table: every lookup degrades to the fallback curve
        let table = EfficiencyTable::new();
        let s = scheme(&table);
        let ig = s.igamma(&660).unwrap();
        let eff = fallback_efficiency(660.0, CountMode::Addback, true).unwrap();
        assert_relative_eq!(ig.value, 8000.0 / (eff * 1_000_000.0), max_relative = 1e-12);
    }

    #[test]
    fn most_intense_and_reference_relative() {
        let table = flat_table(10.0);
        let s = scheme(&table);
        // flat efficiency: the most intense line is the one with most counts
        assert_eq!(s.most_intense(), Some(660));

        // the reference line reports exactly 100, efficiency curve or not
        let rel = s.igamma_relative(&660, None).unwrap();
        assert_eq!(rel.percent, 100.0);
        let mut fallback_only = scheme(&table);
        fallback_only = fallback_only.global_efficiency_only();
        assert_eq!(fallback_only.igamma_relative(&660, None).unwrap().percent, 100.0);

        // a non-reference line scales by counts ratio (efficiencies equal)
        let rel = s.igamma_relative(&1460, None).unwrap();
        assert_relative_eq!(rel.percent, 100.0 * 2000.0 / 8000.0, max_relative = 1e-12);
        // literature relative: 100·5.1/12.5
        assert_relative_eq!(rel.literature_percent, 100.0 * 5.1 / 12.5, max_relative = 1e-12);

        // unknown literature reports 0
        let rel = s.igamma_relative(&2610, None).unwrap();
        assert_eq!(rel.literature_percent, 0.0);

        let all = s.igammas_relative().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].key, 660);
    }

    #[test]
    fn i_beta_balances_feed_and_drain() {
        let table = flat_table(10.0);
        let s = scheme(&table);

        let ig660 = s.igamma(&660).unwrap();
        let ig1460 = s.igamma(&1460).unwrap();
        let balance = BetaLevel {
            level: 1460,
            feeding: vec![660],
            draining: vec![1460],
            literature: LitValue::parse("3.0"),
        };
        let ib = s.i_beta(&balance).unwrap();
        assert_relative_eq!(ib.value, ig660.value - ig1460.value, max_relative = 1e-12);
        let frac = ((ig660.error / ig660.value).powi(2) + (ig1460.error / ig1460.value).powi(2))
            .sqrt();
        assert_relative_eq!(ib.error, frac * ib.value, max_relative = 1e-12);
    }

    #[test]
    fn i_beta_empty_lists_is_zero() {
        let table = flat_table(10.0);
        let s = scheme(&table);
        let ib = s
            .i_beta(&BetaLevel {
                level: 660,
                feeding: vec![],
                draining: vec![],
                literature: LitValue::unknown(),
            })
            .unwrap();
        assert_eq!(ib.value, 0.0);
        assert_eq!(ib.error, 0.0);
    }

    #[test]
    fn i_beta_validates_every_key_first() {
        let table = flat_table(10.0);
        let s = scheme(&table);
        let missing_head = BetaLevel {
            level: 999,
            feeding: vec![660],
            draining: vec![],
            literature: LitValue::unknown(),
        };
        assert!(matches!(s.i_beta(&missing_head), Err(Error::KeyNotFound(_))));

        let missing_feed = BetaLevel {
            level: 660,
            feeding: vec![999],
            draining: vec![],
            literature: LitValue::unknown(),
        };
        assert!(matches!(s.i_beta(&missing_feed), Err(Error::KeyNotFound(_))));

        let missing_drain = BetaLevel {
            level: 660,
            feeding: vec![1460],
            draining: vec![999],
            literature: LitValue::unknown(),
        };
        assert!(matches!(s.i_beta(&missing_drain), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn tables_render() {
        let table = flat_table(10.0);
        let s = scheme(&table);
        let absolute = s.absolute_table().unwrap();
        assert!(absolute.starts_with("Mg36 I_gamma for 1000000 mother decays"));
        assert!(absolute.contains("literature <5.1"));
        assert!(absolute.contains("literature ?"));

        let relative = s.relative_table(true).unwrap();
        assert!(relative.contains("most intense"));
        assert!(relative.contains("fwhm="));

        let beta = s
            .beta_table(
                &[BetaLevel {
                    level: 660,
                    feeding: vec![],
                    draining: vec![],
                    literature: LitValue::parse("1.0"),
                }],
                false,
            )
            .unwrap();
        assert!(beta.contains("I_beta"));
    }

    #[test]
    fn alternate_curve_is_reported_in_tables() {
        let mut table = EfficiencyTable::new().with_quenching(1.0);
        let flat = [0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        table.insert_curve("Na33", DetectorConfig::Inside, flat, flat);
        let mut s = IntensityScheme::<u32>::new("Mg36", 1000.0, 10.0, "0.4", 4.0, &table)
            .with_efficiency_curve("Na33");
        s.add_level(660, 660.0, 100.0, 5.0, LitValue::unknown(), 2.0);
        let rendered = s.absolute_table().unwrap();
        assert!(rendered.contains("Using efficiency curve from Na33"));
    }
}
