use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::{GraphError, Result};
use crate::traits::Equivalent;

/// Bond order label. `Aromatic` is its own order and never compares equal
/// to single or double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

/// Error returned when a bond-order label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bond order '{0}'")]
pub struct ParseBondOrderError(pub String);

impl BondOrder {
    /// Electron pairs shared by the bond; aromatic counts as 1.5.
    pub fn value(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// One-letter label: `S`, `D`, `T` or `B` (benzene).
    pub fn symbol(self) -> char {
        match self {
            BondOrder::Single => 'S',
            BondOrder::Double => 'D',
            BondOrder::Triple => 'T',
            BondOrder::Aromatic => 'B',
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "S" | "1" => Ok(BondOrder::Single),
            "D" | "2" => Ok(BondOrder::Double),
            "T" | "3" => Ok(BondOrder::Triple),
            "B" | "1.5" => Ok(BondOrder::Aromatic),
            other => Err(ParseBondOrderError(other.to_string())),
        }
    }
}

/// Chemistry-labelled edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bond {
    pub order: BondOrder,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self { order }
    }

    pub fn single() -> Self {
        Self::new(BondOrder::Single)
    }

    pub fn double() -> Self {
        Self::new(BondOrder::Double)
    }

    pub fn triple() -> Self {
        Self::new(BondOrder::Triple)
    }

    pub fn aromatic() -> Self {
        Self::new(BondOrder::Aromatic)
    }

    pub fn is_single(&self) -> bool {
        self.order == BondOrder::Single
    }

    pub fn is_double(&self) -> bool {
        self.order == BondOrder::Double
    }

    pub fn is_triple(&self) -> bool {
        self.order == BondOrder::Triple
    }

    pub fn is_aromatic(&self) -> bool {
        self.order == BondOrder::Aromatic
    }

    /// Raise single to double or double to triple.
    pub fn increment_order(&mut self) -> Result<()> {
        self.order = match self.order {
            BondOrder::Single => BondOrder::Double,
            BondOrder::Double => BondOrder::Triple,
            other => {
                return Err(GraphError::InvalidStructure(format!(
                    "cannot increment bond order {other}"
                )))
            }
        };
        Ok(())
    }

    /// Lower triple to double or double to single.
    pub fn decrement_order(&mut self) -> Result<()> {
        self.order = match self.order {
            BondOrder::Triple => BondOrder::Double,
            BondOrder::Double => BondOrder::Single,
            other => {
                return Err(GraphError::InvalidStructure(format!(
                    "cannot decrement bond order {other}"
                )))
            }
        };
        Ok(())
    }
}

impl From<BondOrder> for Bond {
    fn from(order: BondOrder) -> Self {
        Self::new(order)
    }
}

impl Equivalent for Bond {
    fn equivalent(&self, other: &Bond) -> bool {
        self.order == other.order
    }
}
