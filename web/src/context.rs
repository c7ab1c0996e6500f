pub use crate::mongo::context::{Context, MongodmContext};

use log::{info, warn};
use mongodm::sync_indexes;

use crate::stores::pokemon::PokemonCfg;

/// Creates the lookup indexes of the pokemon collection. A failure is only
/// logged, the service answers without them.
pub async fn sync_pokemon_indexes(ctx: &Context) {
    match sync_indexes::<PokemonCfg>(&ctx.database()).await {
        Ok(()) => info!("Pokemon indexes are in sync"),
        Err(err) => warn!("Cannot sync pokemon indexes: {}", err),
    }
}
