pub mod pokemon;

pub use pokemon::{Page, PokemonInput, PokemonOutput, PokemonQuery, PokemonService};
