pub mod context;
pub mod sequence;
pub mod service;
pub mod test_util;
pub mod withid;
pub use mongodb;
pub use mongodm;
use pokedex_utils as utils;
