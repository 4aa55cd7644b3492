//! Bucketed rounding of raw bid prices into line item friendly values.
//!
//! All arithmetic happens in cents. A raw price is multiplied by
//! `input_cents_multiplier`, rounded onto the grid of the bucket it falls
//! into and divided by `output_cents_divisor` for display.
//!
//! Bucket `i` covers the half-open cent range `(max[i-1], max[i]]` (the first
//! bucket starts at zero). Its grid is `max[i-1] + k * step[i]` plus the
//! bucket's own `max`, so the rounded value never leaves the bucket and
//! rounding twice yields the same value as rounding once. Prices above the
//! last bucket are capped to its `max`.
//!
//! Prices strictly below `floor` are rejected. A price at or above the floor
//! that rounds down below it is clamped up to the floor.

use {
    rust_decimal::{Decimal, RoundingStrategy},
    std::fmt,
    thiserror::Error,
};

/// How a price gets snapped onto the grid of its bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rounding {
    /// Keep the exact value.
    None,
    #[default]
    Floor,
    /// Round to the nearest grid value, halves go up.
    Round,
    Ceil,
}

impl Rounding {
    fn apply(self, value: Decimal) -> Decimal {
        match self {
            Self::None => value,
            Self::Floor => value.floor(),
            Self::Round => value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            Self::Ceil => value.ceil(),
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Floor => "floor",
            Self::Round => "round",
            Self::Ceil => "ceil",
        })
    }
}

/// A price band in cents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// The inclusive upper bound of the band.
    pub max: Decimal,
    /// The rounding increment within the band.
    pub step: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The minimum acceptable price in cents.
    pub floor: Decimal,
    /// Multiply raw prices by this to get cents.
    pub input_cents_multiplier: Decimal,
    /// Divide rounded cents by this for output.
    pub output_cents_divisor: Decimal,
    /// Decimal places in the output.
    pub output_precision: u32,
    pub rounding: Rounding,
    pub buckets: Vec<Bucket>,
}

impl Default for Config {
    /// 5 cent steps up to $20, 1 dollar steps up to $50, raw prices in dollars
    /// and the output in whole cents.
    fn default() -> Self {
        Self {
            floor: Decimal::ZERO,
            input_cents_multiplier: Decimal::ONE_HUNDRED,
            output_cents_divisor: Decimal::ONE,
            output_precision: 0,
            rounding: Rounding::Floor,
            buckets: vec![
                Bucket {
                    max: Decimal::from(2000),
                    step: Decimal::from(5),
                },
                Bucket {
                    max: Decimal::from(5000),
                    step: Decimal::from(100),
                },
            ],
        }
    }
}

/// Why a raw price has no targeting value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("price is below the floor")]
    BelowFloor,
    #[error("price does not fit into the decimal range")]
    OutOfRange,
}

/// Transforms raw bid prices into targeting values.
#[derive(Clone, Debug)]
pub struct Transformer {
    config: Config,
}

impl Transformer {
    pub fn new(mut config: Config) -> Self {
        config.buckets.sort_by_key(|bucket| bucket.max);
        Self { config }
    }

    /// Transforms a raw price into its display value.
    pub fn transform(&self, raw: Decimal) -> Result<String, Rejected> {
        let cents = self.cents(raw)?;
        let value = cents
            .checked_div(self.config.output_cents_divisor)
            .ok_or(Rejected::OutOfRange)?
            .round_dp_with_strategy(self.config.output_precision, RoundingStrategy::ToZero);
        Ok(format!(
            "{value:.precision$}",
            precision = self.config.output_precision as usize
        ))
    }

    /// The rounded price in cents.
    fn cents(&self, raw: Decimal) -> Result<Decimal, Rejected> {
        let cents = raw
            .checked_mul(self.config.input_cents_multiplier)
            .ok_or(Rejected::OutOfRange)?;
        if cents < self.config.floor || cents.is_sign_negative() {
            return Err(Rejected::BelowFloor);
        }
        Ok(self.snap(cents).max(self.config.floor).normalize())
    }

    fn snap(&self, cents: Decimal) -> Decimal {
        let rounding = self.config.rounding;
        let Some(top) = self.config.buckets.last() else {
            return rounding.apply(cents);
        };
        if cents >= top.max {
            return top.max;
        }

        let mut lower = Decimal::ZERO;
        for bucket in &self.config.buckets {
            if cents <= bucket.max {
                if cents == bucket.max || rounding == Rounding::None {
                    return cents;
                }
                let steps = rounding.apply((cents - lower) / bucket.step);
                return (lower + steps * bucket.step).min(bucket.max);
            }
            lower = bucket.max;
        }
        unreachable!("prices above the last bucket are capped")
    }
}
