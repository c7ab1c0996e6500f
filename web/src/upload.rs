//! Image uploads.
//!
//! An uploaded file is first written to the staging directory, then moved to
//! the public asset directory once the rest of the form is known to be valid.
//! Whoever holds a `StagedImage` or `StoredImage` is responsible for
//! discarding it when a later step fails.

use std::{
    collections::HashMap,
    fmt::Display,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use actix_multipart::Multipart;
use actix_web::web::Bytes;
use chrono::Utc;
use futures::{Stream, TryStreamExt};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use validator::Validate;

use crate::{
    app_error::AppError,
    services::pokemon::PokemonInput,
    utils::{
        config::Config,
        result::{Result, StdResult},
        simple_error,
    },
};

pub const IMAGE_FIELD: &str = "image";
pub const ASSET_PATH: &str = "assets/pokemons";
const TEXT_FIELDS: [&str; 3] = ["name", "type", "base"];

#[derive(Debug, Clone)]
pub struct UploadStore {
    staging_dir: PathBuf,
    public_dir: PathBuf,
    base_url: String,
}

#[derive(Debug, PartialEq)]
pub struct StagedImage {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
}

impl UploadStore {
    pub fn new(config: &Config) -> Self {
        Self::with_dirs(
            &config.upload_dir,
            Path::new(&config.static_dir).join(ASSET_PATH),
            format!("{}/{}", config.public_url(), ASSET_PATH),
        )
    }

    pub fn with_dirs(
        staging_dir: impl Into<PathBuf>,
        public_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            public_dir: public_dir.into(),
            base_url: base_url.into(),
        }
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Writes `chunks` to `<unix millis><extension of original_name>` in the
    /// staging directory.
    pub async fn stage<S, E>(&self, original_name: &str, chunks: S) -> Result<StagedImage>
    where
        S: Stream<Item = StdResult<Bytes, E>>,
        E: Display,
    {
        self.stage_at(Utc::now().timestamp_millis(), original_name, chunks)
            .await
    }

    async fn stage_at<S, E>(
        &self,
        millis: i64,
        original_name: &str,
        chunks: S,
    ) -> Result<StagedImage>
    where
        S: Stream<Item = StdResult<Bytes, E>>,
        E: Display,
    {
        fs::create_dir_all(&self.staging_dir).await?;
        let (staged, mut file) = self.create_new(millis, &extension_of(original_name)).await?;
        let written = write_chunks(&mut file, chunks).await;
        drop(file);
        match written {
            Ok(size) => {
                debug!("staged {} ({} bytes)", staged.path.display(), size);
                Ok(staged)
            }
            Err(err) => {
                self.discard(&staged).await;
                Err(err)
            }
        }
    }

    /// Opens a file that did not exist before. The timestamp is bumped while
    /// the name is taken in either directory.
    async fn create_new(&self, mut millis: i64, extension: &str) -> Result<(StagedImage, File)> {
        loop {
            let filename = format!("{}{}", millis, extension);
            if fs::metadata(self.public_dir.join(&filename)).await.is_ok() {
                millis += 1;
                continue;
            }
            let path = self.staging_dir.join(&filename);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((StagedImage { filename, path }, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Moves a staged file into the public directory. On failure the staged
    /// file is removed.
    pub async fn promote(&self, staged: StagedImage) -> Result<StoredImage> {
        let path = self.public_dir.join(&staged.filename);
        if let Err(err) = self.move_to(&staged.path, &path).await {
            self.discard(&staged).await;
            return Err(err);
        }
        Ok(StoredImage {
            filename: staged.filename,
            path,
        })
    }

    async fn move_to(&self, from: &Path, to: &Path) -> Result<()> {
        fs::create_dir_all(&self.public_dir).await?;
        if let Err(err) = fs::rename(from, to).await {
            // rename cannot cross filesystems
            debug!("rename failed ({}), copying instead", err);
            fs::copy(from, to).await?;
            remove_logged(from).await;
        }
        Ok(())
    }

    pub async fn discard(&self, staged: &StagedImage) {
        remove_logged(&staged.path).await
    }

    pub async fn remove(&self, stored: &StoredImage) {
        remove_logged(&stored.path).await
    }

    pub fn public_url(&self, stored: &StoredImage) -> String {
        format!("{}/{}", self.base_url, stored.filename)
    }
}

async fn remove_logged(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        warn!("cannot remove {}: {}", path.display(), err);
    }
}

async fn write_chunks<S, E>(file: &mut File, chunks: S) -> Result<usize>
where
    S: Stream<Item = StdResult<Bytes, E>>,
    E: Display,
{
    let mut chunks = Box::pin(chunks);
    let mut size = 0;
    while let Some(chunk) = chunks.try_next().await.map_err(|e| simple_error!("{}", e))? {
        size += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

/// `.ext` of the original file name, or nothing when it is missing or not
/// plain alphanumeric.
fn extension_of(original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", ext)
        }
        _ => String::new(),
    }
}

async fn read_text<S, E>(key: &str, chunks: S) -> StdResult<String, AppError>
where
    S: Stream<Item = StdResult<Bytes, E>>,
    E: Display,
{
    let mut chunks = Box::pin(chunks);
    let mut buf = Vec::new();
    while let Some(chunk) = chunks
        .try_next()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::bad_request(format!("Form field `{}` is not UTF-8", key)))
}

/// The multipart body of a create request.
#[derive(Debug, Default)]
pub struct PokemonForm {
    pub image: Option<StagedImage>,
    fields: HashMap<String, String>,
}

impl PokemonForm {
    /// Reads every part of `payload`. On error nothing stays staged.
    pub async fn read(mut payload: Multipart, uploads: &UploadStore) -> StdResult<Self, AppError> {
        let mut form = Self::default();
        match form.read_parts(&mut payload, uploads).await {
            Ok(()) => Ok(form),
            Err(err) => {
                form.discard(uploads).await;
                Err(err)
            }
        }
    }

    async fn read_parts(
        &mut self,
        payload: &mut Multipart,
        uploads: &UploadStore,
    ) -> StdResult<(), AppError> {
        while let Some(field) = payload
            .try_next()
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?
        {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_owned();
            let filename = disposition.get_filename().map(str::to_owned);
            match filename {
                Some(filename) if name == IMAGE_FIELD => {
                    if self.image.is_some() {
                        return Err(AppError::bad_request("Only one image may be uploaded"));
                    }
                    self.image = Some(uploads.stage(&filename, field).await?);
                }
                None if TEXT_FIELDS.contains(&name.as_str()) => {
                    let text = read_text(&name, field).await?;
                    self.fields.insert(name, text);
                }
                _ => {
                    debug!("ignoring form field {:?}", name);
                    field
                        .try_for_each(|_| async { Ok(()) })
                        .await
                        .map_err(|e| AppError::bad_request(e.to_string()))?;
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn insert_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Decodes the JSON carried by the `name`, `type` and `base` fields.
    pub fn parse(&self) -> StdResult<PokemonInput, AppError> {
        let input = PokemonInput {
            name: self.json("name")?,
            type_: self.json("type")?,
            base: self.json("base")?,
            image: None,
        };
        input.validate()?;
        Ok(input)
    }

    fn json<T: DeserializeOwned>(&self, key: &str) -> StdResult<T, AppError> {
        let raw = self
            .fields
            .get(key)
            .ok_or_else(|| AppError::bad_request(format!("Missing form field `{}`", key)))?;
        serde_json::from_str(raw).map_err(|err| {
            AppError::bad_request(format!("Invalid JSON in form field `{}`: {}", key, err))
        })
    }

    pub async fn discard(&mut self, uploads: &UploadStore) {
        if let Some(staged) = self.image.take() {
            uploads.discard(&staged).await;
        }
    }
}
