//! The PlanetLang interpreter.
//!
//! A script is read line by line in a single forward pass. Directive lines
//! open blocks or mutate the scene directly; any other line is a field of
//! the currently open block. Nothing here fails: malformed lines and
//! references to unknown ids are skipped.
//!
//! Besides the scene, the interpreter owns the entity bindings, the click
//! flags, and the queue of texture syncs bound for the render host.

use serde_json::json;

use crate::bindings::{Bindings, ClickState};
use crate::config::{BlockScope, InterpreterConfig};
use crate::directive::{classify, rule_name, Directive};
use crate::host::{install_costume, place, AssetKind, Costume, RenderHost};
use crate::numeric::{coerce_coordinate, parse_gravity};
use crate::scene_model::{Background, EntityKind, SceneModel, SceneSnapshot};
use crate::texture_sync::{
    PendingSync, SyncQueue, SyncReport, TextureFetcher, NON_SVG_MARKER,
};

/// Which field group the following content lines fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Thumbnail,
    Spawn,
    Texture,
    Position,
    Size,
    Properties,
    OnClick,
}

/// Parser state carried from one line to the next.
#[derive(Debug, Default)]
struct Cursor<'s> {
    block: Option<Block>,
    id: Option<&'s str>,
    kind: Option<EntityKind>,
}

impl<'s> Cursor<'s> {
    fn open(&mut self, block: Block, id: Option<&'s str>, kind: Option<EntityKind>) {
        self.block = Some(block);
        self.id = id;
        self.kind = kind;
    }
}

/// Text after `key`, anywhere in the line.
fn after<'l>(line: &'l str, key: &str) -> Option<&'l str> {
    line.find(key).map(|at| &line[at + key.len()..])
}

/// Trim and drop a trailing `;`.
fn clean(value: &str) -> String {
    value.trim().trim_end_matches(';').trim_end().to_string()
}

pub struct PlanetInterpreter<H: RenderHost, F: TextureFetcher> {
    config: InterpreterConfig,
    scene: SceneModel,
    bindings: Bindings,
    clicks: ClickState,
    host: H,
    fetcher: F,
    syncs: SyncQueue,
}

impl<H: RenderHost, F: TextureFetcher> PlanetInterpreter<H, F> {
    pub fn new(host: H, fetcher: F) -> Self {
        Self::with_config(InterpreterConfig::default(), host, fetcher)
    }

    pub fn with_config(config: InterpreterConfig, host: H, fetcher: F) -> Self {
        Self {
            config,
            scene: SceneModel::new(),
            bindings: Bindings::new(),
            clicks: ClickState::new(),
            host,
            fetcher,
            syncs: SyncQueue::new(),
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Clear the scene and the click flags. Bindings and queued syncs stay.
    pub fn reset(&mut self) {
        self.scene.reset();
        self.clicks.clear();
    }

    // ── Parsing ───────────────────────────────────────────────────────────

    /// Rebuild the scene from `script`.
    pub fn parse(&mut self, script: &str) {
        self.reset();

        let mut cursor = Cursor::default();
        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let directive = classify(line);
            log::trace!("{} {:?} <- {}", rule_name(line).unwrap_or("content"), directive, line);

            if directive.is_directive() {
                self.apply_directive(directive, &mut cursor);
            } else {
                self.apply_content(line, &cursor);
                if self.config.block_scope == BlockScope::ResetAfterContent {
                    cursor.block = None;
                    cursor.kind = None;
                }
            }
        }

        log::debug!(
            "parsed planet: valid={}, {} objects, {} backgrounds, {} syncs pending",
            self.scene.valid_signature,
            self.scene.object_ids().count(),
            self.scene.background_ids().count(),
            self.syncs.len()
        );
    }

    fn apply_directive<'s>(&mut self, directive: Directive<'s>, cursor: &mut Cursor<'s>) {
        match directive {
            Directive::Signature => self.scene.valid_signature = true,
            Directive::Thumbnail => cursor.block = Some(Block::Thumbnail),
            Directive::Spawn => cursor.block = Some(Block::Spawn),
            Directive::NewBackground(Some(id)) => {
                self.scene.put_background(id, Background::default());
                cursor.id = Some(id);
                cursor.kind = Some(EntityKind::Background);
            }
            Directive::NewObject(Some(id)) => {
                self.scene.object_or_insert(id);
                cursor.id = Some(id);
                cursor.kind = Some(EntityKind::Object);
            }
            Directive::NewBackground(None) | Directive::NewObject(None) => {}
            Directive::SwitchBackground(Some(id)) => self.switch_background(id),
            Directive::SwitchBackground(None) => {}
            Directive::SetPosition(id) => {
                cursor.open(Block::Position, id, Some(EntityKind::Object))
            }
            Directive::SetTexture { id, kind } => cursor.open(Block::Texture, id, kind),
            Directive::SetSize(id) => cursor.open(Block::Size, id, Some(EntityKind::Object)),
            Directive::Properties(id) => {
                cursor.open(Block::Properties, id, Some(EntityKind::Object))
            }
            Directive::OnClick(id) => cursor.open(Block::OnClick, id, Some(EntityKind::Object)),
            Directive::Remove => {
                if cursor.block == Some(Block::OnClick) {
                    if let Some(object) = cursor.id.and_then(|id| self.scene.object_mut(id)) {
                        object.onclick = true;
                    }
                }
            }
            Directive::Content => {}
        }
    }

    fn apply_content(&mut self, line: &str, cursor: &Cursor<'_>) {
        let Some(block) = cursor.block else {
            log::debug!("ignored line outside any block: {}", line);
            return;
        };
        let numeric = self.config.numeric;

        match block {
            Block::Thumbnail => {
                if let Some(url) = line.strip_prefix("url:") {
                    self.scene.planet.thumbnail_url = clean(url);
                }
            }
            Block::Spawn => {
                let spawn = &mut self.scene.planet.spawn;
                if let Some(raw) = line.strip_prefix("x:") {
                    spawn.x = coerce_coordinate(raw, numeric);
                }
                if let Some(raw) = line.strip_prefix("y:") {
                    spawn.y = coerce_coordinate(raw, numeric);
                }
            }
            Block::Texture => {
                let (Some(id), Some(url)) = (cursor.id, after(line, "url:")) else {
                    return;
                };
                if self.set_texture(id, cursor.kind, clean(url)) {
                    self.apply_texture(id);
                }
            }
            Block::Position => {
                let Some(id) = cursor.id else { return };
                let Some(object) = self.scene.object_mut(id) else { return };
                let mut moved = false;
                if let Some(raw) = after(line, "x:") {
                    object.position.x = coerce_coordinate(raw, numeric);
                    moved = true;
                }
                if let Some(raw) = after(line, "y:") {
                    object.position.y = coerce_coordinate(raw, numeric);
                    moved = true;
                }
                if moved {
                    self.apply_position(id);
                }
            }
            Block::Size => {
                if let Some(object) = cursor.id.and_then(|id| self.scene.object_mut(id)) {
                    object.size = clean(line);
                }
            }
            Block::Properties => {
                let Some(raw) = line.strip_prefix("gravity:") else { return };
                if let Some(object) = cursor.id.and_then(|id| self.scene.object_mut(id)) {
                    object.gravity = parse_gravity(raw);
                }
            }
            Block::OnClick => {}
        }
    }

    /// Activate one background, deactivating every other.
    fn switch_background(&mut self, id: &str) {
        if self.scene.background(id).is_none() {
            return;
        }
        for background in self.scene.backgrounds_mut() {
            background.active = false;
        }
        if let Some(background) = self.scene.background_mut(id) {
            background.active = true;
        }
        self.apply_texture(id);
    }

    /// Store a texture URL on the entity `kind` names, or on whichever owns
    /// the id. Returns false when no entity took it.
    fn set_texture(&mut self, id: &str, kind: Option<EntityKind>, url: String) -> bool {
        match kind.or_else(|| self.scene.kind_of(id)) {
            Some(EntityKind::Object) => match self.scene.object_mut(id) {
                Some(object) => {
                    object.texture_url = url;
                    true
                }
                None => false,
            },
            Some(EntityKind::Background) => match self.scene.background_mut(id) {
                Some(background) => {
                    background.texture_url = url;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    // ── Sync ──────────────────────────────────────────────────────────────

    /// Issue a texture sync for `id` towards its bound entity.
    ///
    /// Returns true when a fetch was queued. The costume only changes once
    /// the queue is drained with [`flush_syncs`](Self::flush_syncs).
    pub fn apply_texture(&mut self, id: &str) -> bool {
        let Some(url) = self.scene.texture_of(id).filter(|url| !url.is_empty()) else {
            return false;
        };
        let Some(entity) = self.bindings.entity_for(id) else {
            return false;
        };
        if self.host.find_entity(entity).is_none() {
            log::debug!("no entity named {} for {}", entity, id);
            return false;
        }

        let kind = AssetKind::from_url(url);
        let sync = PendingSync {
            id: id.to_string(),
            entity: entity.to_string(),
            url: url.to_string(),
            kind,
            fetch: self.fetcher.fetch(url),
        };
        self.syncs.push(sync);
        true
    }

    /// Move every entity bound to `id` to the object's position. Returns the
    /// number of entities moved.
    pub fn apply_position(&mut self, id: &str) -> usize {
        let Some(position) = self.scene.object(id).map(|o| o.position) else {
            return 0;
        };

        let mut moved = 0;
        for name in self.bindings.entities_for(id) {
            for entity in self.host.entities_named(name) {
                place(entity, position);
                moved += 1;
            }
        }
        moved
    }

    pub fn pending_syncs(&self) -> usize {
        self.syncs.len()
    }

    /// Await every queued texture sync, in issue order, and install the
    /// results. Failures are logged and leave the entity untouched.
    pub async fn flush_syncs(&mut self) -> SyncReport {
        let mut report = SyncReport::default();

        while let Some(sync) = self.syncs.pop() {
            let PendingSync { id, entity, url, kind, fetch } = sync;
            match fetch.await {
                Ok(texture) => match self.host.find_entity(&entity) {
                    Some(target) => {
                        let costume = Costume::new(Costume::name_for(&id), kind, texture.bytes, url.as_str());
                        install_costume(target, costume);
                        log::info!("Parsed texture for {}: {}", id, url);
                        report.applied += 1;
                    }
                    None => {
                        log::warn!("entity {} vanished before texture {} landed", entity, url);
                        report.skipped += 1;
                    }
                },
                Err(e) => {
                    log::error!("Failed to apply texture for {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// [`flush_syncs`](Self::flush_syncs) on the current thread, for
    /// fetchers whose futures need no runtime.
    pub fn flush_syncs_blocking(&mut self) -> SyncReport {
        pollster::block_on(self.flush_syncs())
    }

    // ── Bindings & clicks ─────────────────────────────────────────────────

    /// Bind an entity to an object id, reset its click flag, and push the
    /// current texture if there is one.
    pub fn bind(&mut self, entity: &str, id: &str) {
        log::debug!("Bindings: {:?}", self.bindings.iter().collect::<Vec<_>>());
        self.bindings.bind(entity, id);
        self.clicks.seed(id);
        self.apply_texture(id);
    }

    /// Bind an entity to a background id and push its texture if it has one.
    pub fn bind_background(&mut self, entity: &str, id: &str) {
        self.bindings.bind(entity, id);
        let has_texture = self
            .scene
            .background(id)
            .is_some_and(|b| !b.texture_url.is_empty());
        if has_texture {
            self.apply_texture(id);
        }
    }

    /// Record that a bound entity was clicked.
    pub fn notify_clicked(&mut self, entity: &str) {
        if let Some(id) = self.bindings.id_for(entity) {
            self.clicks.mark(id);
        }
    }

    pub fn was_clicked(&self, id: &str) -> bool {
        self.clicks.was_clicked(id)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Object ids, comma-joined in declaration order.
    pub fn object_ids(&self) -> String {
        self.scene.object_ids().collect::<Vec<_>>().join(",")
    }

    /// Background ids, comma-joined in declaration order.
    pub fn background_ids(&self) -> String {
        self.scene.background_ids().collect::<Vec<_>>().join(",")
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.scene.planet.thumbnail_url
    }

    pub fn spawn_x(&self) -> f64 {
        self.scene.planet.spawn.x
    }

    pub fn spawn_y(&self) -> f64 {
        self.scene.planet.spawn.y
    }

    pub fn object_x(&self, id: &str) -> f64 {
        self.scene.object(id).map_or(0.0, |o| o.position.x)
    }

    pub fn object_y(&self, id: &str) -> f64 {
        self.scene.object(id).map_or(0.0, |o| o.position.y)
    }

    /// JSON record of an object's properties; `{}` until gravity is set.
    pub fn object_properties(&self, id: &str) -> String {
        match self.scene.object(id) {
            Some(object) if object.gravity.is_set() => {
                json!({ "gravity": object.gravity }).to_string()
            }
            _ => "{}".to_string(),
        }
    }

    pub fn is_valid_planet_file(&self) -> bool {
        self.scene.valid_signature
    }

    /// Raw SVG text of the texture for `id`, [`NON_SVG_MARKER`] for other
    /// content types, or an empty string when there is nothing to fetch or
    /// the fetch fails.
    pub async fn texture_data(&self, id: &str) -> String {
        let Some(url) = self.scene.texture_of(id).filter(|url| !url.is_empty()) else {
            return String::new();
        };

        match self.fetcher.fetch(url).await {
            Ok(texture) => match texture.content_type.as_deref() {
                Some(_) if texture.is_svg() => String::from_utf8_lossy(&texture.bytes).into_owned(),
                Some(_) => NON_SVG_MARKER.to_string(),
                None => {
                    log::error!("Failed to fetch texture: no content type for {}", url);
                    String::new()
                }
            },
            Err(e) => {
                log::error!("Failed to fetch texture: {}", e);
                String::new()
            }
        }
    }
}
