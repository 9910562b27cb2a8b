//! Merchant sectors and the ETFs whose volatility stands in for them.
//!
//! Each session is attributed to one sector, drawn by order-mix weight:
//! groceries 50%, fast food 30%, pharmacy 20%.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Groceries,
    FastFood,
    Pharmacy,
}

impl Sector {
    pub const ALL: [Sector; 3] = [Sector::Groceries, Sector::FastFood, Sector::Pharmacy];

    /// Sector ETF used as the volatility proxy.
    pub fn etf(self) -> &'static str {
        match self {
            Sector::Groceries => "XLP",
            Sector::FastFood => "XLY",
            Sector::Pharmacy => "XLV",
        }
    }

    /// Share of orders falling in this sector.
    pub fn weight(self) -> f64 {
        match self {
            Sector::Groceries => 0.5,
            Sector::FastFood => 0.3,
            Sector::Pharmacy => 0.2,
        }
    }

    /// Sector for a uniform draw `u` in `[0, 1)`.
    fn from_unit(u: f64) -> Sector {
        let mut upper = 0.0;
        for sector in Self::ALL {
            upper += sector.weight();
            if u < upper {
                return sector;
            }
        }
        Sector::Pharmacy
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sector::Groceries => write!(f, "groceries"),
            Sector::FastFood => write!(f, "fast_food"),
            Sector::Pharmacy => write!(f, "pharmacy"),
        }
    }
}

/// Weighted sector draws from an owned RNG.
pub struct SectorDraw {
    rng: StdRng,
}

impl SectorDraw {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }

    pub fn next_sector(&mut self) -> Sector {
        Sector::from_unit(self.rng.random::<f64>())
    }
}
