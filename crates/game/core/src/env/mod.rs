//! Static content consulted by the rules (ability definitions).

mod abilities;

pub use abilities::{AbilityBook, AbilityBookError, AbilityDefinition, AbilityKind};
