//! YAML directory config storage.
//!
//! Each entity lives in its own file named `{entity_type}.{id}.yml`, which
//! keeps configuration diffable and version-control friendly. The entity id
//! is stored both in the filename and in the content; a mismatch is logged
//! when listing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{ConfigEntity, ConfigFilter, ConfigStorage, entity_types};

/// Maximum config file size (10 MB). Larger files are skipped when listing
/// and rejected when loaded.
const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Characters that are invalid in filenames on Windows/NTFS.
/// Rejected by [`validate_entity_id_for_filename`] for cross-platform portability.
const WINDOWS_INVALID_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|'];

/// Config storage reading and writing one YAML file per entity.
#[derive(Debug, Clone)]
pub struct YamlConfigStorage {
    dir: PathBuf,
}

impl YamlConfigStorage {
    /// Open (and create if needed) a config directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, entity_type: &str, id: &str) -> Result<PathBuf> {
        if !entity_types::ALL.contains(&entity_type) {
            anyhow::bail!("unknown config entity type '{entity_type}'");
        }
        validate_entity_id_for_filename(id)?;
        Ok(self.dir.join(entity_filename(entity_type, id)))
    }

    /// Read a config file, refusing symlinks and oversized files.
    fn read_file(path: &Path) -> Result<String> {
        let metadata = fs::symlink_metadata(path)
            .with_context(|| format!("failed to read metadata for {}", path.display()))?;
        if metadata.file_type().is_symlink() {
            anyhow::bail!("refusing to read symlink {}", path.display());
        }
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            anyhow::bail!(
                "{}: file size {} bytes exceeds limit of {MAX_CONFIG_FILE_SIZE} bytes",
                path.display(),
                metadata.len()
            );
        }
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

impl ConfigStorage for YamlConfigStorage {
    fn load(&self, entity_type: &str, id: &str) -> Result<Option<ConfigEntity>> {
        let path = self.path_for(entity_type, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = Self::read_file(&path)?;
        let entity = deserialize_entity(entity_type, &content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(entity))
    }

    fn save(&self, entity: &ConfigEntity) -> Result<()> {
        let id = entity.id();
        let path = self.path_for(entity.entity_type(), &id)?;
        let yaml = serialize_entity(entity)?;
        fs::write(&path, yaml).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(entity = %entity, path = %path.display(), "saved config entity");
        Ok(())
    }

    fn delete(&self, entity_type: &str, id: &str) -> Result<bool> {
        let path = self.path_for(entity_type, id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
        Ok(true)
    }

    fn list(&self, entity_type: &str, filter: Option<&ConfigFilter>) -> Result<Vec<ConfigEntity>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read directory {}", self.dir.display()))?;

        let mut found: Vec<(String, ConfigEntity)> = Vec::new();
        for entry in entries {
            let path = entry?.path();

            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "skipping file with non-UTF-8 name");
                continue;
            };
            if filename.starts_with('.') {
                continue;
            }
            let Some((file_type, filename_id)) = parse_config_filename(filename) else {
                continue;
            };
            if file_type != entity_type {
                continue;
            }

            let content = match Self::read_file(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %filename, error = %e, "skipping config file");
                    continue;
                }
            };
            let entity = match deserialize_entity(entity_type, &content) {
                Ok(entity) => entity,
                Err(e) => {
                    warn!(file = %filename, error = %e, "failed to parse config file");
                    continue;
                }
            };

            let content_id = entity.id();
            if content_id != filename_id {
                warn!(
                    file = %filename,
                    filename_id,
                    content_id = %content_id,
                    "filename ID does not match content ID"
                );
            }
            if found.iter().any(|(_, e)| e.id() == content_id) {
                warn!(file = %filename, id = %content_id, "duplicate config entity (skipped)");
                continue;
            }
            found.push((filename.to_string(), entity));
        }

        found.sort_by(|a, b| a.1.id().cmp(&b.1.id()).then_with(|| a.0.cmp(&b.0)));
        let entities = found.into_iter().map(|(_, e)| e).collect();

        Ok(match filter {
            Some(filter) => filter.apply(entities),
            None => entities,
        })
    }
}

/// Generate the filename for a config entity.
fn entity_filename(entity_type: &str, id: &str) -> String {
    format!("{entity_type}.{id}.yml")
}

/// Validate that an entity ID is safe for use in a filename.
///
/// Rejects IDs containing path separators, parent-directory references,
/// null bytes, or characters invalid on Windows/NTFS.
fn validate_entity_id_for_filename(id: &str) -> Result<()> {
    if id.is_empty() {
        anyhow::bail!("entity ID is empty");
    }
    if id.contains('/') || id.contains('\\') || id.contains('\0') {
        anyhow::bail!("entity ID contains path separator or null byte: {id}");
    }
    if id.contains("..") {
        anyhow::bail!("entity ID contains '..': {id}");
    }
    if let Some(c) = id.chars().find(|c| WINDOWS_INVALID_CHARS.contains(c)) {
        anyhow::bail!("entity ID contains character '{c}' invalid on Windows: {id}");
    }
    if id.starts_with('.') || id.ends_with('.') {
        anyhow::bail!("entity ID must not start or end with '.': {id}");
    }
    if id != id.trim() {
        anyhow::bail!("entity ID has leading/trailing whitespace: {id}");
    }
    Ok(())
}

/// Parse entity type and ID from a config filename.
///
/// Returns `None` if the filename doesn't match the expected pattern
/// or the entity type prefix is unrecognized.
fn parse_config_filename(filename: &str) -> Option<(&str, &str)> {
    let stem = filename
        .strip_suffix(".yml")
        .or_else(|| filename.strip_suffix(".yaml"))?;

    let (entity_type, id) = stem.split_once('.')?;
    if id.is_empty() || !entity_types::ALL.contains(&entity_type) {
        return None;
    }

    Some((entity_type, id))
}

fn serialize_entity(entity: &ConfigEntity) -> Result<String> {
    let yaml = match entity {
        ConfigEntity::Menu(menu) => serde_yml::to_string(menu),
        ConfigEntity::Tile(tile) => serde_yml::to_string(tile),
    };
    yaml.with_context(|| format!("failed to serialize {entity}"))
}

/// Deserialize YAML content into a ConfigEntity based on entity type.
fn deserialize_entity(entity_type: &str, content: &str) -> Result<ConfigEntity> {
    match entity_type {
        entity_types::MENU => Ok(ConfigEntity::Menu(
            serde_yml::from_str(content).context("invalid menu YAML")?,
        )),
        entity_types::TILE => Ok(ConfigEntity::Tile(
            serde_yml::from_str(content).context("invalid tile YAML")?,
        )),
        other => anyhow::bail!("unknown config entity type '{other}'"),
    }
}
