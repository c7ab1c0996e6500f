pub mod app_data;
pub mod app_error;
pub mod assets;
pub mod context;
pub mod controller;
pub mod server;
pub mod services;
pub mod stores;
pub mod upload;

#[cfg(test)]
mod test_util;

use pokedex_mongo as mongo;
use pokedex_utils as utils;
