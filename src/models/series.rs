use {
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter},
};

/// Which side of the candle body a derived series follows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum PriceField {
    #[strum(to_string = "high")]
    High,
    #[strum(to_string = "low")]
    Low,
}

/// Name of a comparable series: a raw fudged body edge, or an EMA over one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriesName {
    Fudge(PriceField),
    Ema { field: PriceField, span: usize },
}

impl SeriesName {
    pub const FUDGE_HIGH: Self = SeriesName::Fudge(PriceField::High);
    pub const FUDGE_LOW: Self = SeriesName::Fudge(PriceField::Low);

    pub fn ema(field: PriceField, span: usize) -> Self {
        SeriesName::Ema { field, span }
    }

    /// Raw derived price series (not smoothed).
    pub fn is_raw(&self) -> bool {
        matches!(self, SeriesName::Fudge(_))
    }

    pub fn field(&self) -> PriceField {
        match self {
            SeriesName::Fudge(field) | SeriesName::Ema { field, .. } => *field,
        }
    }
}

impl std::fmt::Display for SeriesName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesName::Fudge(field) => write!(f, "fudge_{}", field),
            SeriesName::Ema { field, span } => write!(f, "ema_{}_{}", field, span),
        }
    }
}
