//! Closed bit-flag sets
//!
//! A [`FlagSet`] holds zero or more flags drawn from exactly one closed
//! enumeration. Each enumeration declares its universe through the [`Flag`]
//! trait: an explicit bit per member and an explicit, versioned ordering
//! table. Every encoder in the workspace iterates the ordering table, never
//! the declaration order of the Rust enum, so the wire order stays fixed even
//! if members are reordered in source.
//!
//! # Usage
//!
//! ```ignore
//! use depot_core::{FlagSet, MetadataField};
//!
//! let fields = FlagSet::from_flags([MetadataField::Width, MetadataField::Height]);
//! assert!(fields.contains(MetadataField::Width));
//!
//! let (decoded, warnings) = FlagSet::<MetadataField>::from_bitmask(fields.to_bitmask() | 1 << 40);
//! assert_eq!(decoded, fields);
//! assert_eq!(warnings.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

/// A member of a closed flag universe.
///
/// Implementations must give every member a distinct power-of-two `bit`, and
/// `ORDER` must list every member exactly once.
pub trait Flag: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Human-readable name of the universe, used in warnings and logs
    const UNIVERSE_NAME: &'static str;

    /// Version of the ordering table; bump when members are added
    const TABLE_VERSION: u16;

    /// Canonical emission order for every member of the universe
    const ORDER: &'static [Self];

    /// The single bit this member occupies
    fn bit(self) -> u64;

    /// Canonical wire token for this member
    fn token(self) -> &'static str;

    /// Look up a member by its wire token
    fn from_token(token: &str) -> Option<Self> {
        Self::ORDER.iter().copied().find(|flag| flag.token() == token)
    }

    /// Union of every bit the universe declares
    fn universe_mask() -> u64 {
        Self::ORDER.iter().fold(0, |mask, flag| mask | flag.bit())
    }
}

/// A bit that was present in a raw bitmask but is not declared by the universe.
///
/// Non-fatal: the bit is dropped from the decoded set and reported so callers
/// can surface it, which keeps older clients working against servers that
/// introduce new flags first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownBitWarning {
    /// Universe the bitmask was decoded into
    pub universe: String,
    /// The unrecognized bit, as a single-bit value
    pub bit: u64,
}

impl fmt::Display for UnknownBitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} flag bit {:#x} ignored",
            self.universe, self.bit
        )
    }
}

/// A set of flags from the universe `T`.
///
/// Never stores bits outside `T::universe_mask()`. Values are immutable;
/// every combinator returns a new set.
pub struct FlagSet<T: Flag> {
    bits: u64,
    _universe: PhantomData<T>,
}

impl<T: Flag> FlagSet<T> {
    /// The set with no flags
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            _universe: PhantomData,
        }
    }

    /// Every flag of the universe
    pub fn all() -> Self {
        Self::from_bits_truncate(T::universe_mask())
    }

    /// Build a set from any collection of flags; duplicates collapse
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let bits = flags.into_iter().fold(0, |bits, flag| bits | flag.bit());
        Self::from_bits_truncate(bits)
    }

    fn from_bits_truncate(bits: u64) -> Self {
        Self {
            bits: bits & T::universe_mask(),
            _universe: PhantomData,
        }
    }

    /// Return a copy of this set with `flag` added
    #[must_use]
    pub fn with(self, flag: T) -> Self {
        Self::from_bits_truncate(self.bits | flag.bit())
    }

    /// Flags present in either set
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::from_bits_truncate(self.bits | other.bits)
    }

    /// Flags present in both sets
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self::from_bits_truncate(self.bits & other.bits)
    }

    /// Whether `flag` is present
    pub fn contains(self, flag: T) -> bool {
        let bit = flag.bit();
        bit != 0 && self.bits & bit == bit
    }

    /// Whether no flag is present
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of flags present
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Raw bitmask of the present flags
    pub fn to_bitmask(self) -> u64 {
        self.bits
    }

    /// Decode a raw bitmask.
    ///
    /// Never fails: each set bit outside the universe is dropped and reported
    /// as one [`UnknownBitWarning`], lowest bit first.
    pub fn from_bitmask(mask: u64) -> (Self, Vec<UnknownBitWarning>) {
        let unknown = mask & !T::universe_mask();
        let warnings: Vec<UnknownBitWarning> = (0..u64::BITS)
            .map(|shift| 1u64 << shift)
            .filter(|bit| unknown & bit != 0)
            .map(|bit| UnknownBitWarning {
                universe: T::UNIVERSE_NAME.to_string(),
                bit,
            })
            .collect();

        if !warnings.is_empty() {
            tracing::debug!(
                universe = T::UNIVERSE_NAME,
                table_version = T::TABLE_VERSION,
                unknown_bits = unknown,
                "Dropped unknown flag bits while decoding bitmask"
            );
        }

        (Self::from_bits_truncate(mask), warnings)
    }

    /// Present flags, in the universe's canonical order
    pub fn iter(self) -> impl Iterator<Item = T> {
        T::ORDER
            .iter()
            .copied()
            .filter(move |flag| self.contains(*flag))
    }

    /// Canonical tokens of the present flags, in ordering-table order
    pub fn tokens(self) -> Vec<&'static str> {
        self.iter().map(T::token).collect()
    }
}

impl<T: Flag> Clone for FlagSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Flag> Copy for FlagSet<T> {}

impl<T: Flag> PartialEq for FlagSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T: Flag> Eq for FlagSet<T> {}

impl<T: Flag> Hash for FlagSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T: Flag> Default for FlagSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Flag> fmt::Debug for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Flag> From<T> for FlagSet<T> {
    fn from(flag: T) -> Self {
        Self::empty().with(flag)
    }
}

impl<T: Flag> FromIterator<T> for FlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_flags(iter)
    }
}

impl<T: Flag> BitOr for FlagSet<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl<T: Flag> BitOr<T> for FlagSet<T> {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        self.with(rhs)
    }
}

impl<T: Flag> BitAnd for FlagSet<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}
