//! # Block Palette
//!
//! Numeric block identifiers come from an external registry. The generator
//! speaks in semantic [`BlockKind`]s and resolves them once, at startup,
//! into a [`BlockPalette`] of ids.
//!
//! Unregistered kinds degrade along a fallback chain (`tundra_dirt` →
//! `dirt`, `leaves_pine` → `leaves_oak`, ...). Only a kind at the root of
//! its chain is required.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::error::{GenError, GenResult};

/// Numeric block identifier. Zero is always air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Air (empty).
    pub const AIR: Self = Self(0);

    /// Returns true if this is air.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Semantic block kinds the generator places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockKind {
    /// Deep ground.
    Stone = 0,
    /// Generic sub-surface.
    Dirt = 1,
    /// Cold sub-surface.
    TundraDirt = 2,
    /// Temperate surface.
    Grass = 3,
    /// Desert surface.
    Sand = 4,
    /// Cold surface.
    Snow = 5,
    /// Frozen water (never generated, but plants refuse to root on it).
    Ice = 6,
    /// Rivers and lakes.
    Water = 7,
    /// Tree trunks and branches.
    Log = 8,
    /// Oak canopy.
    LeavesOak = 9,
    /// Pine needles.
    LeavesPine = 10,
    /// Palm fronds.
    LeavesSavanna = 11,
    /// Short grass tuft.
    TallGrass = 12,
    /// Flower.
    Flower = 13,
    /// Desert shrub.
    DeadBush = 14,
    /// Giant mushroom stem.
    MushroomStem = 15,
    /// Giant mushroom cap.
    MushroomCap = 16,
}

impl BlockKind {
    /// Number of kinds.
    pub const COUNT: usize = 17;

    /// All kinds, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Stone,
        Self::Dirt,
        Self::TundraDirt,
        Self::Grass,
        Self::Sand,
        Self::Snow,
        Self::Ice,
        Self::Water,
        Self::Log,
        Self::LeavesOak,
        Self::LeavesPine,
        Self::LeavesSavanna,
        Self::TallGrass,
        Self::Flower,
        Self::DeadBush,
        Self::MushroomStem,
        Self::MushroomCap,
    ];

    /// Registry name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stone => "stone",
            Self::Dirt => "dirt",
            Self::TundraDirt => "tundra_dirt",
            Self::Grass => "grass",
            Self::Sand => "sand",
            Self::Snow => "snow",
            Self::Ice => "ice",
            Self::Water => "water",
            Self::Log => "log",
            Self::LeavesOak => "leaves_oak",
            Self::LeavesPine => "leaves_pine",
            Self::LeavesSavanna => "leaves_savanna",
            Self::TallGrass => "tall_grass",
            Self::Flower => "flower",
            Self::DeadBush => "dead_bush",
            Self::MushroomStem => "mushroom_stem",
            Self::MushroomCap => "mushroom_cap",
        }
    }

    /// The next kind to try when this one is unregistered.
    #[must_use]
    pub const fn fallback(self) -> Option<Self> {
        match self {
            Self::TundraDirt | Self::Grass | Self::Sand | Self::Snow => Some(Self::Dirt),
            Self::Dirt => Some(Self::Stone),
            Self::Ice => Some(Self::Snow),
            Self::LeavesPine | Self::LeavesSavanna | Self::MushroomCap => Some(Self::LeavesOak),
            Self::MushroomStem => Some(Self::Log),
            Self::Flower | Self::DeadBush => Some(Self::TallGrass),
            Self::Stone | Self::Water | Self::Log | Self::LeavesOak | Self::TallGrass => None,
        }
    }
}

/// The block/material registry collaborator.
///
/// Populated once at startup by whoever owns rendering and materials.
pub trait BlockRegistry {
    /// Looks up the id registered for a name.
    fn id_for(&self, name: &str) -> Option<BlockId>;
}

/// In-memory registry handing out sequential ids from 1.
#[derive(Clone, Debug)]
pub struct MaterialRegistry {
    ids: HashMap<String, BlockId>,
    /// `None` once every id is taken.
    next: Option<u16>,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: Some(1),
        }
    }

    /// Creates a registry holding every [`BlockKind`] name.
    #[must_use]
    pub fn with_default_blocks() -> Self {
        let ids: HashMap<_, _> = BlockKind::ALL
            .iter()
            .zip(1u16..)
            .map(|(kind, id)| (kind.name().to_owned(), BlockId(id)))
            .collect();
        let next = u16::try_from(ids.len() + 1).ok();
        Self { ids, next }
    }

    /// Registers a name, returning its id. Re-registering returns the old id.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::RegistryFull`] once all `u16` ids are taken.
    pub fn register(&mut self, name: &str) -> GenResult<BlockId> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let next = self.next.ok_or_else(|| GenError::RegistryFull {
            name: name.to_owned(),
        })?;
        self.next = next.checked_add(1);
        let id = BlockId(next);
        self.ids.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Number of registered blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl BlockRegistry for MaterialRegistry {
    fn id_for(&self, name: &str) -> Option<BlockId> {
        if name == "air" {
            return Some(BlockId::AIR);
        }
        self.ids.get(name).copied()
    }
}

/// Resolved kind → id table. Read-only after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockPalette {
    ids: [BlockId; BlockKind::COUNT],
}

impl BlockPalette {
    /// Resolves every kind against the registry, following fallbacks.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MissingBlock`] if a chain ends without a
    /// registered block.
    pub fn resolve(registry: &impl BlockRegistry) -> GenResult<Self> {
        let mut ids = [BlockId::AIR; BlockKind::COUNT];

        for kind in BlockKind::ALL {
            let mut candidate = kind;
            ids[kind as usize] = loop {
                if let Some(id) = registry.id_for(candidate.name()) {
                    if candidate != kind {
                        tracing::warn!(
                            "block '{}' not registered, using '{}'",
                            kind.name(),
                            candidate.name()
                        );
                    }
                    break id;
                }
                candidate = candidate.fallback().ok_or_else(|| GenError::MissingBlock {
                    name: candidate.name().to_owned(),
                })?;
            };
        }

        Ok(Self { ids })
    }

    /// Id for a kind.
    #[inline]
    #[must_use]
    pub const fn id(&self, kind: BlockKind) -> BlockId {
        self.ids[kind as usize]
    }

    /// Returns true if `id` is what `kind` resolved to.
    #[inline]
    #[must_use]
    pub const fn is(&self, id: BlockId, kind: BlockKind) -> bool {
        self.ids[kind as usize].0 == id.0
    }
}
