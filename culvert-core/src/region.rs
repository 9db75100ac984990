use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hydrologic region of the crossing site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Coastal,
    Interior,
    Northern,
}

/// Power-law regression coefficients `Q = a * A^b` (A in km², Q in m³/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionCoefficients {
    pub a: f64,
    pub b: f64,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Coastal, Region::Interior, Region::Northern];

    /// Regional Q100 regression coefficients.
    pub fn regression(&self) -> RegressionCoefficients {
        match self {
            Region::Coastal => RegressionCoefficients { a: 2.5, b: 0.75 },
            Region::Interior => RegressionCoefficients { a: 1.2, b: 0.70 },
            Region::Northern => RegressionCoefficients { a: 0.9, b: 0.72 },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Region::Coastal => "Coastal",
            Region::Interior => "Interior",
            Region::Northern => "Northern",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coastal" => Ok(Region::Coastal),
            "interior" => Ok(Region::Interior),
            "northern" => Ok(Region::Northern),
            other => Err(format!("unknown region '{}'", other)),
        }
    }
}
