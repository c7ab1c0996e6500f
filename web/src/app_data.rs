use std::{fs, path::PathBuf};

use crate::{
    context::Context,
    upload::UploadStore,
    utils::{config::Config, result::Result},
};

pub struct AppData {
    pub context: Context,
    pub uploads: UploadStore,
    /// Directories served at the root, searched in order.
    pub static_roots: Vec<PathBuf>,
}

impl AppData {
    /// Creates the served directories, they have to exist before the file
    /// services resolve them.
    pub fn new(context: Context, config: &Config) -> Result<Self> {
        let uploads = UploadStore::new(config);
        fs::create_dir_all(uploads.public_dir())?;
        let static_roots = vec![
            PathBuf::from(&config.static_dir),
            PathBuf::from(&config.files_dir),
        ];
        for root in &static_roots {
            fs::create_dir_all(root)?;
        }
        Ok(Self {
            context,
            uploads,
            static_roots,
        })
    }
}
