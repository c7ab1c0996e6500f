pub mod pokemon;

pub use pokemon::{BaseStats, Pokemon, PokemonName, Stat};
