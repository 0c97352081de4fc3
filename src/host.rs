//! Contract with the rendering host that owns visual entities.
//!
//! The interpreter never owns sprites. It resolves them by name through a
//! [`RenderHost`], installs costumes on them and moves them. Hosts differ in
//! how coordinates are written, so an entity exposes either a direct setter
//! or raw fields plus a redraw hook through [`Coordinates`].

use sha2::{Digest, Sha256};

use crate::scene_model::Point;

/// Asset flavour of a texture, decided from the URL alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Vector,
    Raster,
}

impl AssetKind {
    /// `.svg` URLs are vector assets; everything else is raster.
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".svg") {
            AssetKind::Vector
        } else {
            AssetKind::Raster
        }
    }

    pub fn data_format(&self) -> &'static str {
        match self {
            AssetKind::Vector => "svg",
            AssetKind::Raster => "png",
        }
    }
}

/// A texture installed on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Costume {
    pub name: String,
    pub kind: AssetKind,
    pub data: Vec<u8>,
    pub source_url: String,
    /// Content hash plus data format, e.g. `3a7b...e1.svg`.
    pub asset_id: String,
    pub rotation_center: Point,
}

impl Costume {
    pub fn new(name: impl Into<String>, kind: AssetKind, data: Vec<u8>, source_url: impl Into<String>) -> Self {
        let digest = Sha256::digest(&data);
        let asset_id = format!("{:x}.{}", digest, kind.data_format());
        Self {
            name: name.into(),
            kind,
            data,
            source_url: source_url.into(),
            asset_id,
            rotation_center: Point::default(),
        }
    }

    /// Name of the costume synced for a PlanetLang id.
    pub fn name_for(id: &str) -> String {
        format!("{}-texture", id)
    }
}

/// Direct coordinate setter exposed by some entities.
pub trait PositionSetter {
    fn set_xy(&mut self, x: f64, y: f64);
}

/// How an entity lets its coordinates be written.
pub enum Coordinates<'a> {
    /// The entity moves itself (and redraws as needed).
    Direct(&'a mut dyn PositionSetter),
    /// Raw fields; the caller must request a redraw afterwards.
    Fields(&'a mut Point),
}

/// A named visual entity owned by the host.
pub trait VisualEntity {
    fn costumes(&self) -> &[Costume];
    fn costumes_mut(&mut self) -> &mut Vec<Costume>;
    /// Select the costume at `index`.
    fn set_costume(&mut self, index: usize);
    fn coordinates(&mut self) -> Coordinates<'_>;
    /// Redraw after a raw field write.
    fn update_drawable(&mut self) {}
}

/// The rendering host.
pub trait RenderHost {
    type Entity: VisualEntity;

    /// Every entity with this name (clones share their original's name).
    fn entities_named(&mut self, name: &str) -> Vec<&mut Self::Entity>;

    fn find_entity(&mut self, name: &str) -> Option<&mut Self::Entity> {
        self.entities_named(name).into_iter().next()
    }
}

/// Replace a same-named costume or append a new one, then select it.
/// Returns the selected index.
pub fn install_costume<E: VisualEntity + ?Sized>(entity: &mut E, costume: Costume) -> usize {
    let existing = entity.costumes().iter().position(|c| c.name == costume.name);
    let index = match existing {
        Some(index) => {
            entity.costumes_mut()[index] = costume;
            index
        }
        None => {
            let list = entity.costumes_mut();
            list.push(costume);
            list.len() - 1
        }
    };
    entity.set_costume(index);
    index
}

/// Move an entity using whichever coordinate style it supports.
pub fn place<E: VisualEntity + ?Sized>(entity: &mut E, position: Point) {
    let needs_redraw = match entity.coordinates() {
        Coordinates::Direct(setter) => {
            setter.set_xy(position.x, position.y);
            false
        }
        Coordinates::Fields(fields) => {
            *fields = position;
            true
        }
    };
    if needs_redraw {
        entity.update_drawable();
    }
}

/// In-memory sprite used by the command line front end and by tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSprite {
    pub name: String,
    pub costumes: Vec<Costume>,
    pub current_costume: usize,
    pub position: Point,
    /// Whether the sprite exposes a direct coordinate setter.
    pub direct_xy: bool,
    pub redraws: usize,
    pub moves: usize,
}

impl HeadlessSprite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direct_xy: true,
            ..Self::default()
        }
    }

    /// A sprite that only exposes raw coordinate fields.
    pub fn with_raw_fields(name: impl Into<String>) -> Self {
        Self {
            direct_xy: false,
            ..Self::new(name)
        }
    }

    pub fn current(&self) -> Option<&Costume> {
        self.costumes.get(self.current_costume)
    }
}

impl PositionSetter for HeadlessSprite {
    fn set_xy(&mut self, x: f64, y: f64) {
        self.position = Point::new(x, y);
        self.moves += 1;
    }
}

impl VisualEntity for HeadlessSprite {
    fn costumes(&self) -> &[Costume] {
        &self.costumes
    }

    fn costumes_mut(&mut self) -> &mut Vec<Costume> {
        &mut self.costumes
    }

    fn set_costume(&mut self, index: usize) {
        if index < self.costumes.len() {
            self.current_costume = index;
        }
    }

    fn coordinates(&mut self) -> Coordinates<'_> {
        if self.direct_xy {
            Coordinates::Direct(self)
        } else {
            Coordinates::Fields(&mut self.position)
        }
    }

    fn update_drawable(&mut self) {
        self.redraws += 1;
    }
}

/// A flat list of headless sprites.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    pub sprites: Vec<HeadlessSprite>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sprite(mut self, sprite: HeadlessSprite) -> Self {
        self.sprites.push(sprite);
        self
    }

    pub fn sprite(&self, name: &str) -> Option<&HeadlessSprite> {
        self.sprites.iter().find(|s| s.name == name)
    }
}

impl RenderHost for HeadlessHost {
    type Entity = HeadlessSprite;

    fn entities_named(&mut self, name: &str) -> Vec<&mut HeadlessSprite> {
        self.sprites.iter_mut().filter(|s| s.name == name).collect()
    }
}
