use std::collections::BTreeMap;

use mongodm::{CollectionConfig, Index, Indexes, Model};
use validator::{Validate, ValidationError};

use crate::utils::serde::{Deserialize, Serialize};

pub const ID_FIELD: &str = "id";
pub const ENGLISH_NAME_FIELD: &str = "name.english";

#[derive(Serialize, Deserialize, Validate, Clone, Debug, PartialEq)]
pub struct PokemonName {
    #[validate(length(min = 1))]
    pub english: String,
    #[serde(flatten)]
    pub translations: BTreeMap<String, String>,
}

impl PokemonName {
    pub fn english(name: impl Into<String>) -> Self {
        Self {
            english: name.into(),
            translations: BTreeMap::new(),
        }
    }
}

/// A base stat. Imported datasets carry both integral and fractional values.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum Stat {
    Int(i64),
    Float(f64),
}

pub type BaseStats = BTreeMap<String, Stat>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Pokemon {
    pub id: i64,
    pub name: PokemonName,
    #[serde(rename = "type")]
    pub type_: Vec<String>,
    pub base: BaseStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

pub struct PokemonCfg {}

impl CollectionConfig for PokemonCfg {
    fn collection_name() -> &'static str {
        "pokemons"
    }

    fn indexes() -> Indexes {
        Indexes::new()
            .with(Index::new(ID_FIELD))
            .with(Index::new(ENGLISH_NAME_FIELD))
    }
}

impl Model for Pokemon {
    type CollConf = PokemonCfg;
}

pub fn validate_types(types: &[String]) -> Result<(), ValidationError> {
    if types.is_empty() {
        return Err(ValidationError::new("empty_type"));
    }
    if types.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::new("blank_type"));
    }
    Ok(())
}

pub fn validate_base(base: &BaseStats) -> Result<(), ValidationError> {
    if base.keys().any(|k| k.trim().is_empty()) {
        return Err(ValidationError::new("blank_stat_name"));
    }
    let finite = base.values().all(|stat| match stat {
        Stat::Int(_) => true,
        Stat::Float(v) => v.is_finite(),
    });
    if finite {
        Ok(())
    } else {
        Err(ValidationError::new("non_finite_stat"))
    }
}
