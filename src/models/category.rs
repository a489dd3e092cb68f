use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HiveStatsError;

// ---------------------------------------------------------------------------
// Category - One of the fixed statistical groupings reported by the API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Coins,
    Algos,
    GpuBrands,
    NvidiaModels,
    AmdModels,
    Miners,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Coins,
        Category::Algos,
        Category::GpuBrands,
        Category::NvidiaModels,
        Category::AmdModels,
        Category::Miners,
    ];

    /// Key used by the stats API and in snapshot files.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Coins => "coins",
            Category::Algos => "algos",
            Category::GpuBrands => "gpu_brands",
            Category::NvidiaModels => "nvidia_models",
            Category::AmdModels => "amd_models",
            Category::Miners => "miners",
        }
    }

    /// Human-readable name used for report selection.
    pub fn label(self) -> &'static str {
        match self {
            Category::Coins => "Coins",
            Category::Algos => "Algos",
            Category::GpuBrands => "GPU Brands",
            Category::NvidiaModels => "NVIDIA Models",
            Category::AmdModels => "AMD Models",
            Category::Miners => "Miners",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the wire key (`gpu_brands`) or the label (`GPU Brands`),
/// ignoring ASCII case.
impl FromStr for Category {
    type Err = HiveStatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| HiveStatsError::InvalidArgument(format!("Unknown category: {}", s)))
    }
}
