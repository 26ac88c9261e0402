//! Surface classification for static colliders.
//!
//! Every collider in the query world carries a small bitmask describing what
//! the controller may do with it (stand against it, grab it, mantle from it)
//! plus the stable id of its definition. Both are packed into Rapier's
//! `Collider::user_data` so queries can filter without a side table.

use num_traits::{One, PrimInt};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Plain bitmask container over any primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn of<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        for &tag in tags {
            flags.add(tag);
        }
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    /// True when the two masks share at least one bit.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// ```ignore
/// define_bitmask_flags!(Surface, u32, { Solid, Climbable, MantleZone });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::surface::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(Surface, u32, {
    // Blocks the body capsule.
    Solid,
    // Hands may grab it.
    Climbable,
    // Sensor volume that offers a mantle stand point.
    MantleZone,
});

/// Mask over [`Surface`] flags.
pub type SurfaceMask = BitmaskFlags<u32>;

impl SurfaceMask {
    /// Geometry the body capsule collides with.
    pub fn solid() -> Self {
        Self::of(&[Surface::Solid])
    }

    /// Geometry hands may latch onto.
    pub fn climbable() -> Self {
        Self::of(&[Surface::Climbable])
    }

    /// Sensor volumes carrying a mantle stand point.
    pub fn mantle_zone() -> Self {
        Self::of(&[Surface::MantleZone])
    }

    /// Everything except sensors: the default rock face is both.
    pub fn climbable_rock() -> Self {
        Self::of(&[Surface::Solid, Surface::Climbable])
    }
}

const FLAG_BITS: u32 = 32;

/// Pack a surface id and its flags into a collider `user_data` word.
#[inline]
pub fn pack_user_data(id: u32, flags: SurfaceMask) -> u128 {
    ((id as u128) << FLAG_BITS) | flags.bits as u128
}

/// Inverse of [`pack_user_data`].
#[inline]
pub fn unpack_user_data(user_data: u128) -> (u32, SurfaceMask) {
    let id = (user_data >> FLAG_BITS) as u32;
    let flags = SurfaceMask::new((user_data & u32::MAX as u128) as u32);
    (id, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rock_is_solid_and_climbable_but_not_a_zone() {
        let rock = SurfaceMask::climbable_rock();
        assert!(rock.has(Surface::Solid));
        assert!(rock.has(Surface::Climbable));
        assert!(!rock.has(Surface::MantleZone));
        assert!(rock.intersects(SurfaceMask::climbable()));
        assert!(!rock.intersects(SurfaceMask::mantle_zone()));
    }

    #[test]
    fn user_data_keeps_id_and_flags_apart() {
        let flags = SurfaceMask::of(&[Surface::Climbable, Surface::MantleZone]);
        let packed = pack_user_data(0xDEAD_BEEF, flags);
        let (id, out) = unpack_user_data(packed);
        assert_eq!(id, 0xDEAD_BEEF);
        assert_eq!(out, flags);
    }

    #[test]
    fn remove_clears_only_that_bit() {
        let mut flags = SurfaceMask::climbable_rock();
        flags.remove(Surface::Climbable);
        assert_eq!(flags, SurfaceMask::solid());
        assert!(!flags.is_empty());
    }
}
