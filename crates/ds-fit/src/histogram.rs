//! Uniform-binning 1-D histogram.

use ds_core::{CurveModel, Error, Result};

/// A named 1-D histogram with uniform binning.
///
/// The merge contract for partial histograms filled from independent data
/// partitions is plain bin-wise addition ([`Histogram::add_scaled`] with a
/// scale of 1), which is commutative, so no ordering is required when
/// summing worker outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Number of bins (excluding under/overflow, which are not stored).
    pub n_bins: usize,
    /// Lower edge of the first bin.
    pub x_min: f64,
    /// Upper edge of the last bin.
    pub x_max: f64,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
}

impl Histogram {
    /// Create an empty histogram.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for zero bins or a non-increasing axis.
    pub fn new(name: impl Into<String>, n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidArgument("histogram needs at least one bin".into()));
        }
        if !(x_min < x_max) {
            return Err(Error::InvalidArgument(format!(
                "histogram axis must satisfy x_min < x_max, got [{x_min}, {x_max}]"
            )));
        }
        Ok(Self { name: name.into(), n_bins, x_min, x_max, bin_content: vec![0.0; n_bins] })
    }

    /// Build a histogram by evaluating a model at every bin center.
    ///
    /// Used for synthetic data, residual templates, and fit overlays.
    pub fn from_model<M: CurveModel>(
        name: impl Into<String>,
        n_bins: usize,
        x_min: f64,
        x_max: f64,
        model: &M,
        params: &[f64],
    ) -> Result<Self> {
        let mut hist = Self::new(name, n_bins, x_min, x_max)?;
        for bin in 0..n_bins {
            hist.bin_content[bin] = model.eval(hist.bin_center(bin), params);
        }
        Ok(hist)
    }

    /// Width of each bin.
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_bins as f64
    }

    /// Center of bin `bin` (0-based).
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.x_min + (bin as f64 + 0.5) * self.bin_width()
    }

    /// Bin index holding `x`, or `None` outside the axis range.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if x < self.x_min || x >= self.x_max {
            return None;
        }
        let bin = ((x - self.x_min) / self.bin_width()) as usize;
        Some(bin.min(self.n_bins - 1))
    }

    /// Fill one entry at `x` (entries outside the axis are dropped).
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Fill one weighted entry at `x`.
    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        if let Some(bin) = self.find_bin(x) {
            self.bin_content[bin] += weight;
        }
    }

    /// Set the content of bin `bin`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the bin index is out of range.
    pub fn set_bin_content(&mut self, bin: usize, value: f64) -> Result<()> {
        if bin >= self.n_bins {
            return Err(Error::InvalidArgument(format!(
                "bin {bin} out of range for {} bins",
                self.n_bins
            )));
        }
        self.bin_content[bin] = value;
        Ok(())
    }

    /// Sum of bin contents over `[low, high]`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when either bound falls outside the axis.
    pub fn integral(&self, low: f64, high: f64) -> Result<f64> {
        let (low_bin, high_bin) = match (self.find_bin(low), self.find_bin(high)) {
            (Some(l), Some(h)) => (l, h),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "integration bounds [{low}, {high}] must lie inside the axis [{}, {})",
                    self.x_min, self.x_max
                )))
            }
        };
        Ok(self.bin_content[low_bin..=high_bin].iter().sum())
    }

    /// Bin-wise `self += scale * other`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the binnings differ.
    pub fn add_scaled(&mut self, other: &Histogram, scale: f64) -> Result<()> {
        if self.n_bins != other.n_bins || self.x_min != other.x_min || self.x_max != other.x_max {
            return Err(Error::InvalidArgument(format!(
                "histogram binnings differ: {} bins [{}, {}] vs {} bins [{}, {}]",
                self.n_bins, self.x_min, self.x_max, other.n_bins, other.x_min, other.x_max
            )));
        }
        for (a, b) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *a += scale * b;
        }
        Ok(())
    }

    /// Sum of all bin contents.
    pub fn total(&self) -> f64 {
        self.bin_content.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fill_and_find() {
        let mut h = Histogram::new("h", 10, 0.0, 10.0).unwrap();
        h.fill(0.5);
        h.fill(9.99);
        h.fill(-1.0); // dropped
        h.fill(10.0); // upper edge exclusive, dropped
        assert_eq!(h.bin_content[0], 1.0);
        assert_eq!(h.bin_content[9], 1.0);
        assert_eq!(h.total(), 2.0);
        assert_eq!(h.find_bin(5.0), Some(5));
        assert_relative_eq!(h.bin_center(5), 5.5);
    }

    #[test]
    fn integral_bounds_checked() {
        let mut h = Histogram::new("h", 4, 0.0, 4.0).unwrap();
        for bin in 0..4 {
            h.set_bin_content(bin, 1.0).unwrap();
        }
        assert_eq!(h.integral(0.5, 3.5).unwrap(), 4.0);
        assert!(h.integral(-1.0, 3.0).is_err());
        assert!(h.integral(0.5, 4.5).is_err());
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = Histogram::new("a", 5, 0.0, 5.0).unwrap();
        let mut b = Histogram::new("b", 5, 0.0, 5.0).unwrap();
        a.fill(0.5);
        a.fill(2.5);
        b.fill(2.5);
        b.fill(4.5);

        let mut ab = a.clone();
        ab.add_scaled(&b, 1.0).unwrap();
        let mut ba = b.clone();
        ba.add_scaled(&a, 1.0).unwrap();
        assert_eq!(ab.bin_content, ba.bin_content);

        let mismatched = Histogram::new("c", 6, 0.0, 5.0).unwrap();
        assert!(ab.add_scaled(&mismatched, 1.0).is_err());
    }

    #[test]
    fn invalid_construction() {
        assert!(Histogram::new("h", 0, 0.0, 1.0).is_err());
        assert!(Histogram::new("h", 10, 1.0, 1.0).is_err());
    }
}
