/// Domain types
///
/// Accounts with their refresh-token slot, the hero catalog, and
/// input validation shared by the route handlers.

mod account;
mod hero;
pub mod validation;

pub use account::{Account, RefreshTokenState};
pub use hero::{
    Ability, AbilityRequest, Hero, HeroFilter, HeroRequest, HeroRole, NewAbility, NewHero,
};
