use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{VariantId, VariantOrder};
use crate::error::{StackError, StackResult};

/// Pool size drawn when no explicit size is configured.
pub const DEFAULT_POOL_SIZE: usize = 500;

const MAX_RGB: u32 = 0xFF_FFFF;

/// `#rrggbb` color, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    #[must_use]
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(format!("#{red:02x}{green:02x}{blue:02x}"))
    }

    /// Builds a color from the low 24 bits of `value`.
    #[must_use]
    pub fn from_u24(value: u32) -> Self {
        Self(format!("#{:06x}", value & MAX_RGB))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn to_u24(&self) -> u32 {
        // Validated on construction.
        u32::from_str_radix(&self.0[1..], 16).unwrap_or_default()
    }
}

impl FromStr for HexColor {
    type Err = StackError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw
            .strip_prefix('#')
            .ok_or_else(|| StackError::InvalidColor(format!("{raw:?} must start with `#`")))?;
        if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(StackError::InvalidColor(format!(
                "{raw:?} must have exactly 6 hex digits"
            )));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for HexColor {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered colors zipped against sorted variant ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorPool(Vec<HexColor>);

impl ColorPool {
    #[must_use]
    pub fn new(colors: Vec<HexColor>) -> Self {
        Self(colors)
    }

    pub fn parse<I, S>(colors: I) -> StackResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        colors
            .into_iter()
            .map(|color| color.as_ref().parse())
            .collect::<StackResult<Vec<_>>>()
            .map(Self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[HexColor] {
        &self.0
    }
}

/// Color per variant id, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorAssignment(IndexMap<VariantId, HexColor>);

impl ColorAssignment {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HexColor> {
        self.0.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariantId, &HexColor)> {
        self.0.iter()
    }

    /// Colors laid out in display order, one per entry of `order`.
    #[must_use]
    pub fn colors_for(&self, order: &VariantOrder) -> Vec<Option<&HexColor>> {
        order.iter().map(|id| self.0.get(id.as_str())).collect()
    }
}

/// Sorts `ids` lexicographically and gives the id at position `i` the color `pool[i]`.
pub fn assign<'a, I>(pool: &ColorPool, ids: I) -> StackResult<ColorAssignment>
where
    I: IntoIterator<Item = &'a VariantId>,
{
    let mut sorted: Vec<&VariantId> = ids.into_iter().collect();
    sorted.sort();
    sorted.dedup();
    if pool.len() < sorted.len() {
        return Err(StackError::InsufficientPalette {
            colors: pool.len(),
            variants: sorted.len(),
        });
    }

    Ok(ColorAssignment(
        sorted
            .into_iter()
            .cloned()
            .zip(pool.0.iter().cloned())
            .collect(),
    ))
}

/// Draws `size` independent uniformly random colors.
#[must_use]
pub fn regenerate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> ColorPool {
    ColorPool(
        (0..size)
            .map(|_| HexColor::from_u24(rng.random_range(0..=MAX_RGB)))
            .collect(),
    )
}
