//! Combat resolution system.
//!
//! Pure functions that turn two loadouts into damage. All combat logic is
//! deterministic and side-effect free.
//!
//! # Core Functions
//!
//! - `power`: stat total, optionally weighted by an ability
//! - `resolve_hit`: attacker → defender damage with mitigation and cap
//! - `apply_damage`: synergy reduction (clamped to 0)

mod power;
mod result;

pub use power::{Loadout, power};
pub use result::{HitResult, apply_damage, resolve_hit};
