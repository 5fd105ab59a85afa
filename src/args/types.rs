use std::num::{NonZeroU64, NonZeroUsize};
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::ValidationError;

/// Report rendering for headless runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

// Zero is never a meaningful request count, concurrency cap, or refresh
// interval, so those knobs share a pair of NonZero-backed newtypes.
macro_rules! positive_newtype {
    ($name:ident, $nonzero:ty, $raw:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name($nonzero);

        impl $name {
            #[must_use]
            pub const fn get(self) -> $raw {
                self.0.get()
            }
        }

        impl TryFrom<$raw> for $name {
            type Error = ValidationError;

            fn try_from(value: $raw) -> Result<Self, Self::Error> {
                match <$nonzero>::new(value) {
                    Some(inner) => Ok(Self(inner)),
                    None => Err(ValidationError::ValueTooSmall { min: 1 }),
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let parsed: $raw = s
                    .trim()
                    .parse()
                    .map_err(|source| ValidationError::InvalidNumber { source })?;
                Self::try_from(parsed)
            }
        }
    };
}

positive_newtype!(PositiveU64, NonZeroU64, u64);
positive_newtype!(PositiveUsize, NonZeroUsize, usize);
