/// Hero catalog entities
///
/// A hero owns its abilities; replacing or deleting a hero replaces or
/// deletes every ability with it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::validation::{check_length, check_optional_length};
use crate::error::ValidationError;

const MAX_HERO_NAME_LENGTH: usize = 100;
const MAX_PORTRAIT_LENGTH: usize = 500;
const MAX_HERO_DESCRIPTION_LENGTH: usize = 1000;
const MAX_ABILITY_NAME_LENGTH: usize = 100;
const MAX_ABILITY_DESCRIPTION_LENGTH: usize = 500;
const MAX_ICON_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroRole {
    Tank,
    Damage,
    Support,
}

impl HeroRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroRole::Tank => "tank",
            HeroRole::Damage => "damage",
            HeroRole::Support => "support",
        }
    }
}

impl fmt::Display for HeroRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeroRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tank" => Ok(HeroRole::Tank),
            "damage" => Ok(HeroRole::Damage),
            "support" => Ok(HeroRole::Support),
            _ => Err(ValidationError::InvalidFormat(
                "role must be one of tank, damage, support".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ability {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hero {
    pub id: i64,
    pub name: String,
    pub role: HeroRole,
    pub portrait: Option<String>,
    pub description: Option<String>,
    pub health: i32,
    pub armor: i32,
    pub shields: i32,
    pub abilities: Vec<Ability>,
}

/// Validated hero contents, without ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHero {
    pub name: String,
    pub role: HeroRole,
    pub portrait: Option<String>,
    pub description: Option<String>,
    pub health: i32,
    pub armor: i32,
    pub shields: i32,
    pub abilities: Vec<NewAbility>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAbility {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Hero body accepted by create and update
#[derive(Debug, Deserialize)]
pub struct HeroRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub portrait: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub shields: i32,
    #[serde(default)]
    pub abilities: Vec<AbilityRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AbilityRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl HeroRequest {
    pub fn validate(self) -> Result<NewHero, ValidationError> {
        let name = check_length("name", &self.name, MAX_HERO_NAME_LENGTH)?;
        let role = self.role.parse::<HeroRole>()?;
        let portrait = check_optional_length("portrait", self.portrait, MAX_PORTRAIT_LENGTH)?;
        let description =
            check_optional_length("description", self.description, MAX_HERO_DESCRIPTION_LENGTH)?;

        for (field, value) in [("health", self.health), ("armor", self.armor), ("shields", self.shields)] {
            if value < 0 {
                return Err(ValidationError::OutOfRange(field.to_string()));
            }
        }

        let abilities = self
            .abilities
            .into_iter()
            .map(AbilityRequest::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewHero {
            name,
            role,
            portrait,
            description,
            health: self.health,
            armor: self.armor,
            shields: self.shields,
            abilities,
        })
    }
}

impl AbilityRequest {
    fn validate(self) -> Result<NewAbility, ValidationError> {
        Ok(NewAbility {
            name: check_length("ability name", &self.name, MAX_ABILITY_NAME_LENGTH)?,
            description: check_optional_length(
                "ability description",
                self.description,
                MAX_ABILITY_DESCRIPTION_LENGTH,
            )?,
            icon: check_optional_length("ability icon", self.icon, MAX_ICON_LENGTH)?,
        })
    }
}

/// Query filter for listing heroes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeroFilter {
    pub role: Option<String>,
    pub name: Option<String>,
}

impl HeroFilter {
    /// Blank query parameters are ignored
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
        };
        Self {
            role: clean(self.role),
            name: clean(self.name),
        }
    }

    /// Role is compared case-insensitively; name is a case-insensitive substring match.
    /// Expects a normalized filter.
    pub fn matches(&self, hero: &Hero) -> bool {
        let role_ok = self
            .role
            .as_deref()
            .map_or(true, |role| hero.role.as_str() == role);
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| hero.name.to_lowercase().contains(name));
        role_ok && name_ok
    }
}
