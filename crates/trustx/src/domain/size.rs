use {
    serde::{Deserialize, Serialize},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    std::{fmt, str::FromStr},
};

/// The size of a creative in pixels. Formats as `"{width}x{height}"`, which is
/// also the key the creative store and the targeting values use.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid size {0:?}, expected \"{{width}}x{{height}}\"")]
pub struct ParseError(String);

impl FromStr for Size {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s.split_once('x').ok_or_else(|| ParseError(s.to_owned()))?;
        Ok(Self {
            width: width.parse().map_err(|_| ParseError(s.to_owned()))?,
            height: height.parse().map_err(|_| ParseError(s.to_owned()))?,
        })
    }
}

/// A `[width, height]` pair as it appears in the configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Dimensions(pub u32, pub u32);

impl From<Dimensions> for Size {
    fn from(Dimensions(width, height): Dimensions) -> Self {
        Self { width, height }
    }
}
