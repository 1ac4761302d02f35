use crate::error::{ApiError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardisation learned at training time: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn new(mean: Array1<f64>, scale: Array1<f64>) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Fits mean and population standard deviation per column. Constant
    /// columns get a scale of 1 so they transform to zero instead of NaN.
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        let mean = features.mean_axis(Axis(0)).ok_or_else(|| {
            ApiError::InvalidInput("cannot fit a scaler on an empty matrix".to_string())
        })?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std == 0.0 { 1.0 } else { std });

        Self::new(mean, scale)
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(ApiError::ModelLoadError(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ApiError::ModelLoadError(
                "scaler scale must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.width() {
            return Err(ApiError::SchemaMismatch {
                expected: self.width(),
                got: features.ncols(),
            });
        }

        Ok((features - &self.mean) / &self.scale)
    }
}
