//! Per-device antenna geometry.
//!
//! Each supported sensor is described by a static [`AntennaLayout`]: the
//! physical grid the virtual antennas fold into, which RX channels are wired
//! with inverted phase, and which grid lines lie on the horizontal and
//! vertical baselines. Supporting a new sensor means adding a table entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static antenna geometry descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaLayout {
    /// Grid rows (elevation axis)
    pub rows: usize,
    /// Grid columns (azimuth axis)
    pub cols: usize,
    /// Row-major grid cells; each holds a virtual antenna index or `None` for an empty slot
    pub cells: &'static [Option<usize>],
    /// RX channels whose phase is inverted by the board wiring
    pub inverted_rx: &'static [usize],
    /// Rows lying on the horizontal baseline, used for azimuth
    pub azimuth_rows: &'static [usize],
    /// Columns lying on the vertical baseline, used for elevation
    pub elevation_cols: &'static [usize],
    /// Element spacing in wavelengths
    pub spacing_wavelengths: f64,
    /// Number of virtual antennas this layout expects
    pub virtual_antennas: usize,
}

impl AntennaLayout {
    pub fn cell(&self, row: usize, col: usize) -> Option<usize> {
        self.cells[row * self.cols + col]
    }

    /// Virtual antenna indices along a grid row, skipping empty cells.
    pub fn row_antennas(&self, row: usize) -> Vec<usize> {
        (0..self.cols).filter_map(|c| self.cell(row, c)).collect()
    }

    /// Virtual antenna indices along a grid column, skipping empty cells.
    pub fn col_antennas(&self, col: usize) -> Vec<usize> {
        (0..self.rows).filter_map(|r| self.cell(r, col)).collect()
    }

    /// `(row, column)` of a virtual antenna on the grid.
    pub fn position(&self, antenna: usize) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|&cell| cell == Some(antenna))
            .map(|i| (i / self.cols, i % self.cols))
    }

    /// Virtual antennas of the longest horizontal baseline row.
    pub fn azimuth_array(&self) -> Vec<usize> {
        self.azimuth_rows
            .iter()
            .map(|&r| self.row_antennas(r))
            .max_by_key(|antennas| antennas.len())
            .unwrap_or_default()
    }
}

#[rustfmt::skip]
const ODS_CELLS: [Option<usize>; 16] = [
    Some(0), Some(3), Some(4), Some(7),
    Some(1), Some(2), Some(5), Some(6),
    None, None, Some(8), Some(11),
    None, None, Some(9), Some(10),
];

#[rustfmt::skip]
const IWR1843_CELLS: [Option<usize>; 16] = [
    None, None, Some(4), Some(5), Some(6), Some(7), None, None,
    Some(0), Some(1), Some(2), Some(3), Some(8), Some(9), Some(10), Some(11),
];

const IWR6843ISK_ODS: AntennaLayout = AntennaLayout {
    rows: 4,
    cols: 4,
    cells: &ODS_CELLS,
    inverted_rx: &[1, 2],
    azimuth_rows: &[0, 1],
    elevation_cols: &[2, 3],
    spacing_wavelengths: 0.5,
    virtual_antennas: 12,
};

const IWR1843: AntennaLayout = AntennaLayout {
    rows: 2,
    cols: 8,
    cells: &IWR1843_CELLS,
    inverted_rx: &[],
    azimuth_rows: &[1],
    elevation_cols: &[2, 3, 4, 5],
    spacing_wavelengths: 0.5,
    virtual_antennas: 12,
};

/// Supported radar sensor models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DeviceModel {
    /// IWR6843ISK-ODS: 3 TX x 4 RX folded into a 4x4 grid
    #[serde(rename = "IWR6843ISK-ODS")]
    #[value(name = "iwr6843isk-ods")]
    Iwr6843IskOds,
    /// IWR1843: 3 TX x 4 RX folded into a 2x8 grid
    #[serde(rename = "IWR1843")]
    #[value(name = "iwr1843")]
    Iwr1843,
}

impl DeviceModel {
    pub fn layout(&self) -> &'static AntennaLayout {
        match self {
            Self::Iwr6843IskOds => &IWR6843ISK_ODS,
            Self::Iwr1843 => &IWR1843,
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iwr6843IskOds => write!(f, "IWR6843ISK-ODS"),
            Self::Iwr1843 => write!(f, "IWR1843"),
        }
    }
}
