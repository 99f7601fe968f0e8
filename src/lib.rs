mod tag;
mod repr; // Used by tag module
// Note - tag module contains Debug and Display implementations for NBT -> SNBT
pub mod snbt;

pub mod io;
pub mod root;

#[expect(unreachable_pub, reason = "I know that nothing here is publicly reachable")]
mod raw;

pub mod settings;


pub use self::repr::*;
pub use self::tag::*;
