use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Culvert barrel material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CulvertMaterial {
    /// Corrugated steel pipe
    #[serde(rename = "CSP")]
    Csp,
    /// High-density polyethylene (smooth interior)
    #[serde(rename = "HDPE")]
    Hdpe,
    Concrete,
}

impl CulvertMaterial {
    /// Manning roughness coefficient `n` for a full barrel.
    pub fn mannings_n(&self) -> f64 {
        match self {
            CulvertMaterial::Csp => 0.024,
            CulvertMaterial::Hdpe => 0.012,
            CulvertMaterial::Concrete => 0.013,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CulvertMaterial::Csp => "CSP",
            CulvertMaterial::Hdpe => "HDPE",
            CulvertMaterial::Concrete => "Concrete",
        }
    }
}

impl fmt::Display for CulvertMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CulvertMaterial {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csp" | "corrugated steel" => Ok(CulvertMaterial::Csp),
            "hdpe" | "plastic" => Ok(CulvertMaterial::Hdpe),
            "concrete" => Ok(CulvertMaterial::Concrete),
            other => Err(format!("unknown culvert material '{}'", other)),
        }
    }
}
