//! Fixture state and its partition into categories

use alloc::boxed::Box;
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::phase::Category;

/// On/off state of every fixture in the chain
///
/// The length is fixed for the lifetime of a value. Position `i` is
/// character `i` of the bit string the vector is parsed from or printed as.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct LightVector {
    bits: Box<[bool]>,
}

impl LightVector {
    /// All fixtures off
    pub fn zeroed(len: usize) -> Self {
        Self {
            bits: vec![false; len].into_boxed_slice(),
        }
    }

    /// Parse a string of `'0'` and `'1'` characters
    pub fn parse(bits: &str) -> Result<Self> {
        let bits = bits
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::InvalidInput(format!(
                    "unexpected {other:?} at position {position}, expected '0' or '1'"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            bits: bits.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Set one fixture, returning its previous state
    ///
    /// Returns `None` if `index` is out of range.
    pub fn set(&mut self, index: usize, on: bool) -> Option<bool> {
        let bit = self.bits.get_mut(index)?;
        Some(core::mem::replace(bit, on))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Number of fixtures switched on
    pub fn count_on(&self) -> usize {
        self.bits.iter().filter(|&&on| on).count()
    }

    /// Number of fixtures switched on among `indices`
    ///
    /// Out of range indices count as off.
    pub fn count_on_in(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .filter(|&&index| self.get(index) == Some(true))
            .count()
    }
}

impl From<Vec<bool>> for LightVector {
    fn from(bits: Vec<bool>) -> Self {
        Self {
            bits: bits.into_boxed_slice(),
        }
    }
}

impl fmt::Display for LightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &on in &self.bits {
            f.write_str(if on { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Share of the chain given to houses and commercial buildings, in percent
///
/// Street lights take the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutShares {
    house: u8,
    commercial: u8,
}

impl LayoutShares {
    pub fn new(house: u8, commercial: u8) -> Result<Self> {
        if u16::from(house) + u16::from(commercial) > 100 {
            return Err(Error::InvalidLayout(format!(
                "house {house}% and commercial {commercial}% exceed 100%"
            )));
        }
        Ok(Self { house, commercial })
    }

    pub const fn house(self) -> u8 {
        self.house
    }

    pub const fn commercial(self) -> u8 {
        self.commercial
    }

    pub const fn street(self) -> u8 {
        100 - self.house - self.commercial
    }
}

impl Default for LayoutShares {
    fn default() -> Self {
        Self {
            house: 50,
            commercial: 25,
        }
    }
}

/// Assignment of fixture indices to categories
///
/// The three index sets are disjoint and together cover `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLayout {
    len: usize,
    house: Vec<usize>,
    commercial: Vec<usize>,
    street: Vec<usize>,
}

impl FixtureLayout {
    /// Create a layout from explicit index lists
    pub fn new(
        len: usize,
        house: Vec<usize>,
        commercial: Vec<usize>,
        street: Vec<usize>,
    ) -> Result<Self> {
        let mut owner: Vec<Option<Category>> = vec![None; len];
        for (category, indices) in [
            (Category::House, &house),
            (Category::Commercial, &commercial),
            (Category::Street, &street),
        ] {
            for &index in indices {
                let Some(slot) = owner.get_mut(index) else {
                    return Err(Error::InvalidLayout(format!(
                        "{category} fixture {index} is outside a chain of {len}"
                    )));
                };
                if let Some(previous) = slot.replace(category) {
                    return Err(Error::InvalidLayout(format!(
                        "fixture {index} is assigned to both {previous} and {category}"
                    )));
                }
            }
        }

        if let Some(index) = owner.iter().position(Option::is_none) {
            return Err(Error::InvalidLayout(format!(
                "fixture {index} has no category"
            )));
        }

        Ok(Self {
            len,
            house,
            commercial,
            street,
        })
    }

    /// Contiguous blocks: houses first, then commercial, then street lights
    pub fn proportional(len: usize, shares: LayoutShares) -> Self {
        let houses = len * usize::from(shares.house()) / 100;
        let commercial = len * usize::from(shares.commercial()) / 100;
        Self {
            len,
            house: (0..houses).collect(),
            commercial: (houses..houses + commercial).collect(),
            street: (houses + commercial..len).collect(),
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixture indices of `category`
    pub fn indices(&self, category: Category) -> &[usize] {
        match category {
            Category::House => &self.house,
            Category::Commercial => &self.commercial,
            Category::Street => &self.street,
        }
    }

    /// Category that owns fixture `index`
    pub fn category_of(&self, index: usize) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|&category| self.indices(category).contains(&index))
    }
}

