//! Site wiring: host services, tile placements and region rendering.
//!
//! A [`Site`] is built from a [`SiteFile`] plus a config storage backend.
//! Menus and placements from the file seed the storage the first time; after
//! that the storage is authoritative, so configured tile settings survive a
//! reload.

mod file;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use dom_bootstrap_sdk::render::RenderElement;

use crate::breadcrumb::PATH_CONTEXT;
use crate::cache::RenderCache;
use crate::config_storage::{ConfigEntity, ConfigStorage, entity_types};
use crate::error::{Error, Result};
use crate::host::HostServices;
use crate::local_task::ROUTE_CONTEXT;
use crate::menu::{ACTIVE_TRAILS_CONTEXT, MenuRegistry, PERMISSIONS_CONTEXT};
use crate::permissions::UserContext;
use crate::routing::{RouteMatch, RouteRegistry};
use crate::tap::{DelimiterTap, TAP_COLLAPSIBLE_MENU_ALTER, TapRegistry};
use crate::theme::{ThemeEngine, dom_id, render_attributes};
use crate::tile::{TileContext, TilePlacement, TileRegistry, configure_placement};

pub use file::{SiteFile, SiteUser};

/// Extension name the built-in taps are registered under.
const EXTENSION: &str = "dom_bootstrap";

/// A loaded site.
pub struct Site {
    name: String,
    services: HostServices,
    tiles: TileRegistry,
    storage: Arc<dyn ConfigStorage>,
    theme: ThemeEngine,
    users: BTreeMap<String, UserContext>,
    cache: RenderCache,
}

impl Site {
    /// Build a site, seeding `storage` with the file's menus and placements
    /// that it doesn't hold yet.
    pub fn build(file: SiteFile, storage: Arc<dyn ConfigStorage>, theme: ThemeEngine) -> Result<Self> {
        let mut seeded = 0;
        let entities = file
            .menus
            .into_iter()
            .map(ConfigEntity::Menu)
            .chain(file.tiles.into_iter().map(ConfigEntity::Tile));
        for entity in entities {
            if !storage.exists(entity.entity_type(), &entity.id())? {
                storage.save(&entity)?;
                seeded += 1;
            }
        }

        let menus = storage
            .list(entity_types::MENU, None)?
            .into_iter()
            .filter_map(ConfigEntity::into_menu)
            .collect();
        let menus = MenuRegistry::from_parts(menus, file.menu_links);
        let routes = RouteRegistry::from_definitions(file.routes);

        let mut taps = TapRegistry::new();
        if !file.delimiters.is_empty() {
            let tap = DelimiterTap::new(file.delimiters);
            taps.register(TAP_COLLAPSIBLE_MENU_ALTER, EXTENSION, 0, Arc::new(tap))?;
        }

        let users = file
            .users
            .iter()
            .map(|user| (user.name.clone(), user.context()))
            .collect();

        let services = HostServices::new(routes, menus, file.local_tasks, taps);
        info!(site = %file.name, seeded, services = ?services, "site loaded");

        Ok(Self {
            name: file.name,
            services,
            tiles: TileRegistry::with_defaults(),
            storage,
            theme,
            users,
            cache: RenderCache::new(),
        })
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn storage(&self) -> &dyn ConfigStorage {
        self.storage.as_ref()
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.theme
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// The user to render for: a named site user, or anonymous.
    pub fn user(&self, name: Option<&str>) -> Option<UserContext> {
        match name {
            None => Some(UserContext::anonymous()),
            Some(name) => self.users.get(name).cloned(),
        }
    }

    /// All placements, ordered by machine name.
    pub fn placements(&self) -> Result<Vec<TilePlacement>> {
        Ok(self
            .storage
            .list(entity_types::TILE, None)?
            .into_iter()
            .filter_map(ConfigEntity::into_tile)
            .collect())
    }

    pub fn placement(&self, machine_name: &str) -> Result<TilePlacement> {
        self.storage
            .load(entity_types::TILE, machine_name)?
            .and_then(ConfigEntity::into_tile)
            .ok_or_else(|| Error::PlacementNotFound(machine_name.to_string()))
    }

    /// Route match for a path; unknown paths match no route.
    pub fn route_match(&self, path: &str) -> RouteMatch {
        self.services.routes().match_path(path).unwrap_or_else(|| {
            debug!(path, "no route matches path");
            RouteMatch {
                route_name: String::new(),
                path: path.to_string(),
                params: Default::default(),
            }
        })
    }

    pub fn context(&self, path: &str, user: &UserContext) -> TileContext {
        TileContext::new(self.route_match(path), user.clone(), self.services.clone())
    }

    /// Build the render tree of a placement, with the tile's own cache
    /// metadata applied and theme hooks narrowed to the placement.
    pub fn build_placement(&self, placement: &TilePlacement, ctx: &TileContext) -> Result<RenderElement> {
        let tile = self.tiles.create_for(placement)?;
        let mut element = tile.build(ctx);
        element.apply_cacheability(&tile.cache_metadata());

        // `collapsible_links` becomes `collapsible_links__<placement>`
        for child in element.children.values_mut() {
            if let Some(hook) = child.theme.take() {
                child.theme = Some(format!("{hook}__{}", placement.machine_name));
            }
        }
        Ok(element)
    }

    /// Render a placement to HTML, using the render cache when possible.
    pub fn render_placement(&self, placement: &TilePlacement, ctx: &TileContext) -> Result<String> {
        let machine_name = placement.machine_name.as_str();

        if let Some(contexts) = self.cache.known_contexts(machine_name) {
            let key = self.cache_key(machine_name, contexts.iter().map(String::as_str), ctx);
            if let Some(html) = self.cache.get(&key) {
                return Ok(html);
            }
        }

        let element = self.build_placement(placement, ctx)?;
        let metadata = element
            .cache
            .clone()
            .unwrap_or_default()
            .with_tag(placement_tag(machine_name));

        let inner = self
            .theme
            .render_element(&element, machine_name)
            .map_err(Error::Render)?;
        let class = format!("tile tile--{}", dom_id(&placement.tile_type));
        let attributes = serde_json::json!({ "id": format!("tile-{}", dom_id(machine_name)) });
        let html = format!(
            "<div{}>{inner}</div>",
            render_attributes(Some(&attributes), Some(&class))
        );

        // Store under every context seen so far so later lookups compute the same key
        self.cache.remember_contexts(machine_name, &metadata.contexts);
        let contexts = self
            .cache
            .known_contexts(machine_name)
            .unwrap_or_else(|| metadata.contexts.clone());
        let key = self.cache_key(machine_name, contexts.iter().map(String::as_str), ctx);
        self.cache.set(&key, &html, &metadata);
        Ok(html)
    }

    /// Render every enabled, visible placement of a region, lightest first.
    pub fn render_region(&self, region: &str, path: &str, user: &UserContext) -> Result<String> {
        let ctx = self.context(path, user);

        let mut placements: Vec<TilePlacement> = self
            .placements()?
            .into_iter()
            .filter(|p| p.region == region && p.status && p.is_visible(path, &user.roles))
            .collect();
        placements.sort_by(|a, b| {
            a.weight
                .cmp(&b.weight)
                .then_with(|| a.machine_name.cmp(&b.machine_name))
        });

        let mut html = String::new();
        for placement in &placements {
            html.push_str(&self.render_placement(placement, &ctx)?);
        }
        debug!(region, path, tiles = placements.len(), "rendered region");
        Ok(html)
    }

    /// Apply submitted form values to a placement and persist it.
    pub fn configure(
        &self,
        machine_name: &str,
        values: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Result<TilePlacement> {
        let mut placement = self.placement(machine_name)?;
        configure_placement(&self.tiles, &self.services, &mut placement, values)?;
        self.storage.save(&ConfigEntity::Tile(placement.clone()))?;
        self.cache.invalidate_tag(&placement_tag(machine_name));
        Ok(placement)
    }

    fn cache_key<'a>(
        &self,
        machine_name: &str,
        contexts: impl Iterator<Item = &'a str>,
        ctx: &TileContext,
    ) -> String {
        RenderCache::key(
            machine_name,
            contexts.map(|context| (context, self.context_value(context, ctx))),
        )
    }

    /// Resolve a cache context to the value it varies by for this request.
    fn context_value(&self, context: &str, ctx: &TileContext) -> String {
        match context {
            ROUTE_CONTEXT => {
                let mut params: Vec<_> = ctx.route_match.params.iter().collect();
                params.sort();
                let params: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{}?{}", ctx.route_match.route_name, params.join("&"))
            }
            PATH_CONTEXT => ctx.route_match.path.clone(),
            PERMISSIONS_CONTEXT => ctx.user.permissions_hash(),
            other => match other.strip_prefix(ACTIVE_TRAILS_CONTEXT).and_then(|rest| rest.strip_prefix(':')) {
                Some(menu_name) => {
                    let trail = self
                        .services
                        .active_trail()
                        .active_trail_ids(menu_name, &ctx.route_match);
                    trail.into_iter().collect::<Vec<_>>().join(",")
                }
                None => {
                    warn!(context = other, "unknown cache context");
                    String::new()
                }
            },
        }
    }
}

/// Cache tag carried by everything a placement renders.
fn placement_tag(machine_name: &str) -> String {
    format!("config:tile.{machine_name}")
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("name", &self.name)
            .field("services", &self.services)
            .field("tiles", &self.tiles)
            .field("users", &self.users.len())
            .finish()
    }
}
