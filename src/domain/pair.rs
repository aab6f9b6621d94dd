//! Currency pairs evaluated by the dashboard

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::indicator::{DeltaBaseline, Precision};
use crate::shared::types::Interval;

/// Built-in pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairId {
    UsdKrw,
    JpyKrw,
}

impl PairId {
    pub const ALL: [PairId; 2] = [PairId::UsdKrw, PairId::JpyKrw];

    pub fn as_str(&self) -> &'static str {
        match self {
            PairId::UsdKrw => "usd-krw",
            PairId::JpyKrw => "jpy-krw",
        }
    }

    pub fn spec(&self) -> PairSpec {
        match self {
            PairId::UsdKrw => PairSpec {
                id: *self,
                label: "USD/KRW",
                reference: SymbolSpec {
                    symbol: "DX-Y.NYB",
                    name: "USD index",
                    interval: Interval::Daily,
                },
                cross: SymbolSpec {
                    symbol: "USDKRW=X",
                    name: "USD/KRW",
                    interval: Interval::Hourly,
                },
                invert_cross: false,
                precision: Precision::whole_unit(),
                delta_baseline: DeltaBaseline::FairEstimate,
                quote_page: false,
            },
            PairId::JpyKrw => PairSpec {
                id: *self,
                label: "JPY/KRW",
                reference: SymbolSpec {
                    symbol: "^N225",
                    name: "Nikkei 225",
                    interval: Interval::Daily,
                },
                // quoted as JPY per KRW, inverted before use
                cross: SymbolSpec {
                    symbol: "KRWJPY=X",
                    name: "JPY/KRW",
                    interval: Interval::Hourly,
                },
                invert_cross: true,
                precision: Precision::small_unit(),
                delta_baseline: DeltaBaseline::PreviousClose,
                quote_page: true,
            },
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('/', "-").as_str() {
            "usd-krw" | "usd" => Ok(PairId::UsdKrw),
            "jpy-krw" | "jpy" => Ok(PairId::JpyKrw),
            other => Err(format!("unknown pair: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSpec {
    pub symbol: &'static str,
    pub name: &'static str,
    pub interval: Interval,
}

/// Everything that differs between the two pair pipelines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSpec {
    pub id: PairId,
    pub label: &'static str,
    pub reference: SymbolSpec,
    pub cross: SymbolSpec,
    pub invert_cross: bool,
    pub precision: Precision,
    pub delta_baseline: DeltaBaseline,
    /// Whether an auxiliary scraped quote is shown
    pub quote_page: bool,
}

impl PairSpec {
    /// Labels for C1..C4
    pub fn condition_labels(&self, weeks: u32) -> [String; 4] {
        [
            format!("current {} < {}-week mean", self.label, weeks),
            format!("current {} < {}-week mean", self.reference.name, weeks),
            format!("current {} gap ratio > {}-week mean gap ratio", self.reference.name, weeks),
            format!("current {} < fair {}", self.label, self.label),
        ]
    }
}
