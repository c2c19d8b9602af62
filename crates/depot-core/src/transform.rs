//! Transform anchor positions
//!
//! Crop and overlay transforms take an anchor made of at most one vertical
//! and at most one horizontal position. An omitted axis is left out of the
//! output entirely so the remote service applies its own default.

use crate::errors::ValidationError;
use crate::flags::{Flag, FlagSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positional flag for image transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionAxis {
    /// Top edge
    Top,
    /// Vertical middle
    Middle,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
    /// Horizontal center
    Center,
    /// Right edge
    Right,
}

/// Mutually exclusive groups of [`PositionAxis`] flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisGroup {
    /// Top, middle, bottom
    Vertical,
    /// Left, center, right
    Horizontal,
}

impl AxisGroup {
    /// Every flag belonging to this group
    pub fn members(self) -> FlagSet<PositionAxis> {
        match self {
            AxisGroup::Vertical => FlagSet::from_flags([
                PositionAxis::Top,
                PositionAxis::Middle,
                PositionAxis::Bottom,
            ]),
            AxisGroup::Horizontal => FlagSet::from_flags([
                PositionAxis::Left,
                PositionAxis::Center,
                PositionAxis::Right,
            ]),
        }
    }
}

impl fmt::Display for AxisGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisGroup::Vertical => f.write_str("vertical"),
            AxisGroup::Horizontal => f.write_str("horizontal"),
        }
    }
}

impl PositionAxis {
    /// The exclusivity group this flag belongs to
    pub fn group(self) -> AxisGroup {
        match self {
            PositionAxis::Top | PositionAxis::Middle | PositionAxis::Bottom => AxisGroup::Vertical,
            PositionAxis::Left | PositionAxis::Center | PositionAxis::Right => {
                AxisGroup::Horizontal
            }
        }
    }
}

impl Flag for PositionAxis {
    const UNIVERSE_NAME: &'static str = "position";
    const TABLE_VERSION: u16 = 1;
    const ORDER: &'static [Self] = &[
        PositionAxis::Top,
        PositionAxis::Middle,
        PositionAxis::Bottom,
        PositionAxis::Left,
        PositionAxis::Center,
        PositionAxis::Right,
    ];

    fn bit(self) -> u64 {
        match self {
            PositionAxis::Top => 1 << 0,
            PositionAxis::Middle => 1 << 1,
            PositionAxis::Bottom => 1 << 2,
            PositionAxis::Left => 1 << 3,
            PositionAxis::Center => 1 << 4,
            PositionAxis::Right => 1 << 5,
        }
    }

    fn token(self) -> &'static str {
        match self {
            PositionAxis::Top => "top",
            PositionAxis::Middle => "middle",
            PositionAxis::Bottom => "bottom",
            PositionAxis::Left => "left",
            PositionAxis::Center => "center",
            PositionAxis::Right => "right",
        }
    }
}

/// A validated anchor: at most one position per axis group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TransformAnchor {
    vertical: Option<PositionAxis>,
    horizontal: Option<PositionAxis>,
}

impl TransformAnchor {
    /// Check a flag selection for axis conflicts.
    ///
    /// Fails with [`ValidationError::ConflictingAxis`] naming the first group
    /// (vertical before horizontal) that has more than one active flag.
    pub fn validate(flags: FlagSet<PositionAxis>) -> Result<Self, ValidationError> {
        Ok(Self {
            vertical: single_in_group(flags, AxisGroup::Vertical)?,
            horizontal: single_in_group(flags, AxisGroup::Horizontal)?,
        })
    }

    /// Vertical position, if one was selected
    pub fn vertical(&self) -> Option<PositionAxis> {
        self.vertical
    }

    /// Horizontal position, if one was selected
    pub fn horizontal(&self) -> Option<PositionAxis> {
        self.horizontal
    }

    /// Canonical tokens, vertical first; absent axes are omitted
    pub fn tokens(&self) -> Vec<&'static str> {
        self.vertical
            .into_iter()
            .chain(self.horizontal)
            .map(PositionAxis::token)
            .collect()
    }

    /// Comma-joined tokens for a transform task parameter, e.g. `top,left`
    pub fn to_param(&self) -> String {
        self.tokens().join(",")
    }
}

fn single_in_group(
    flags: FlagSet<PositionAxis>,
    group: AxisGroup,
) -> Result<Option<PositionAxis>, ValidationError> {
    let active = flags.intersection(group.members());
    if active.len() > 1 {
        return Err(ValidationError::ConflictingAxis {
            group,
            flags: active.tokens().into_iter().map(str::to_string).collect(),
        });
    }
    Ok(active.iter().next())
}

/// Validate `flags` and resolve them to canonical anchor tokens
pub fn resolve(flags: FlagSet<PositionAxis>) -> Result<Vec<&'static str>, ValidationError> {
    TransformAnchor::validate(flags).map(|anchor| anchor.tokens())
}
