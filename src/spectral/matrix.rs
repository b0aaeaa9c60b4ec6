use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;

use crate::error::{RadarError, Result};

/// Physical quantity carried by a bin axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Range,
    Doppler,
    Azimuth,
    Elevation,
    Chirp,
}

impl Quantity {
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Range => "m",
            Self::Doppler => "m/s",
            Self::Azimuth | Self::Elevation => "deg",
            Self::Chirp => "#",
        }
    }
}

/// Ordered bin centres along one matrix dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinAxis {
    pub quantity: Quantity,
    pub values: Vec<f64>,
}

impl BinAxis {
    pub fn new(quantity: Quantity, values: Vec<f64>) -> Self {
        Self { quantity, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1] > w[0])
    }
}

/// Matrix aligned to two bin axes.
///
/// `values[[r, c]]` sits at `rows.values[r]`, `cols.values[c]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "T: Serialize"))]
pub struct SpectralMatrix<T = f64> {
    rows: BinAxis,
    cols: BinAxis,
    #[serde(serialize_with = "serialize_rows")]
    values: Array2<T>,
}

impl<T> SpectralMatrix<T> {
    /// Fails with a shape error unless both axes match the matrix and are
    /// strictly increasing.
    pub fn new(rows: BinAxis, cols: BinAxis, values: Array2<T>) -> Result<Self> {
        if values.dim() != (rows.len(), cols.len()) {
            return Err(RadarError::shape(
                "spectral matrix",
                format!("{} x {} from axes", rows.len(), cols.len()),
                format!("{} x {}", values.nrows(), values.ncols()),
            ));
        }
        for axis in [&rows, &cols] {
            if !axis.is_strictly_increasing() {
                return Err(RadarError::shape(
                    "spectral matrix axis",
                    format!("strictly increasing {:?} bins", axis.quantity),
                    "non-monotonic bins",
                ));
            }
        }
        Ok(Self { rows, cols, values })
    }

    pub fn rows(&self) -> &BinAxis {
        &self.rows
    }

    pub fn cols(&self) -> &BinAxis {
        &self.cols
    }

    pub fn values(&self) -> &Array2<T> {
        &self.values
    }

    pub fn into_parts(self) -> (BinAxis, BinAxis, Array2<T>) {
        (self.rows, self.cols, self.values)
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> SpectralMatrix<U> {
        SpectralMatrix {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            values: self.values.map(f),
        }
    }
}

impl SpectralMatrix<Complex64> {
    pub fn magnitude(&self) -> SpectralMatrix<f64> {
        self.map(|z| z.norm())
    }
}

impl SpectralMatrix<f64> {
    /// Largest cell as `(row, col, value)`.
    pub fn peak(&self) -> Option<(usize, usize, f64)> {
        self.values
            .indexed_iter()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|((r, c), &v)| (r, c, v))
    }
}

fn serialize_rows<T: Serialize, S: serde::Serializer>(
    values: &Array2<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(
        values
            .rows()
            .into_iter()
            .map(|row| row.into_iter().collect::<Vec<&T>>()),
    )
}
