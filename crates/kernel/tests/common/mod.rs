#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Sites are built from `tests/fixtures/site.yml` with the real kernel code.
//! Each [`TestSite`] gets its own config directory, removed on drop.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dom_bootstrap::config_storage::{MemoryConfigStorage, YamlConfigStorage};
use dom_bootstrap::permissions::UserContext;
use dom_bootstrap::site::{Site, SiteFile};
use dom_bootstrap::theme::ThemeEngine;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn site_file() -> SiteFile {
    SiteFile::load(&fixtures_dir().join("site.yml")).expect("fixture site should parse")
}

/// Site backed by in-memory config storage and the built-in templates.
pub fn memory_site() -> Site {
    Site::build(
        site_file(),
        Arc::new(MemoryConfigStorage::new()),
        ThemeEngine::builtin().unwrap(),
    )
    .expect("failed to build site")
}

pub fn editor(site: &Site) -> UserContext {
    site.user(Some("editor")).expect("editor is a fixture user")
}

/// A site persisted to a scratch config directory.
pub struct TestSite {
    pub site: Site,
    pub dir: PathBuf,
}

impl TestSite {
    pub fn new(name: &str) -> Self {
        let n = DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "dom_bootstrap_it_{name}_{n}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let site = Self::open(&dir, None);
        Self { site, dir }
    }

    /// Build a fresh site over the same config directory.
    pub fn reload(&self) -> Site {
        Self::open(&self.dir, None)
    }

    /// Build a fresh site over the same config directory with template overrides.
    pub fn reload_with_templates(&self, template_dir: &Path) -> Site {
        Self::open(&self.dir, Some(template_dir))
    }

    fn open(dir: &Path, template_dir: Option<&Path>) -> Site {
        let storage = YamlConfigStorage::open(dir).unwrap();
        let theme = ThemeEngine::new(template_dir).unwrap();
        Site::build(site_file(), Arc::new(storage), theme).expect("failed to build site")
    }
}

impl Drop for TestSite {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}
