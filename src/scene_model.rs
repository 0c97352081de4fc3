//! Scene model populated by PlanetLang scripts.
//!
//! This module holds the data a parse produces: one planet, a set of
//! backgrounds and a set of positioned objects. It carries no behaviour
//! beyond field access and `reset`; every invariant (single active
//! background, idempotent object declaration) is enforced by the interpreter.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;

/// 2D position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The scene root: thumbnail and spawn point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Planet {
    pub thumbnail_url: String,
    pub spawn: Point,
}

/// A background entry declared with `new Background:<id>;`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Background {
    pub texture_url: String,
    pub active: bool,
}

/// Gravity as read from a `properties` block.
///
/// `NotANumber` marks a field that was present but did not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Gravity {
    #[default]
    Unset,
    Value(f64),
    NotANumber,
}

impl Gravity {
    pub fn is_set(&self) -> bool {
        !matches!(self, Gravity::Unset)
    }

    /// Numeric value, if the field parsed to one.
    pub fn value(&self) -> Option<f64> {
        match self {
            Gravity::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for Gravity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Gravity::Value(v) => serializer.serialize_f64(*v),
            Gravity::Unset | Gravity::NotANumber => serializer.serialize_none(),
        }
    }
}

/// A positioned object declared with `new Object:<id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneObject {
    pub position: Point,
    pub texture_url: String,
    /// Free-form size token, stored verbatim.
    pub size: String,
    pub gravity: Gravity,
    /// Set by a `remove(...)` line inside an `onclick` block.
    pub onclick: bool,
}

/// The two addressable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Object,
    Background,
}

/// Everything one parse produces.
///
/// Ids keep their declaration order so id listings are stable.
#[derive(Debug, Default)]
pub struct SceneModel {
    pub planet: Planet,
    backgrounds: HashMap<String, Background>,
    background_order: Vec<String>,
    objects: HashMap<String, SceneObject>,
    object_order: Vec<String>,
    /// True once the `planets.push(new Planet);` signature has been seen.
    pub valid_signature: bool,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reinitialise the planet and drop all backgrounds and objects.
    pub fn reset(&mut self) {
        self.planet = Planet::default();
        self.backgrounds.clear();
        self.background_order.clear();
        self.objects.clear();
        self.object_order.clear();
        self.valid_signature = false;
    }

    /// Insert (or overwrite) a background, returning the fresh entry.
    pub fn put_background(&mut self, id: &str, background: Background) -> &mut Background {
        match self.backgrounds.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(background);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.background_order.push(id.to_string());
                entry.insert(background)
            }
        }
    }

    /// Get the object with this id, creating a default one if absent.
    pub fn object_or_insert(&mut self, id: &str) -> &mut SceneObject {
        if !self.objects.contains_key(id) {
            self.object_order.push(id.to_string());
        }
        self.objects.entry(id.to_string()).or_default()
    }

    pub fn background(&self, id: &str) -> Option<&Background> {
        self.backgrounds.get(id)
    }

    pub fn background_mut(&mut self, id: &str) -> Option<&mut Background> {
        self.backgrounds.get_mut(id)
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    /// Which entity kind owns `id`, objects first.
    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        if self.objects.contains_key(id) {
            Some(EntityKind::Object)
        } else if self.backgrounds.contains_key(id) {
            Some(EntityKind::Background)
        } else {
            None
        }
    }

    /// Texture URL of the object or background with this id, objects first.
    pub fn texture_of(&self, id: &str) -> Option<&str> {
        self.objects
            .get(id)
            .map(|o| o.texture_url.as_str())
            .or_else(|| self.backgrounds.get(id).map(|b| b.texture_url.as_str()))
    }

    /// Object ids in declaration order.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.object_order.iter().map(String::as_str)
    }

    /// Background ids in declaration order.
    pub fn background_ids(&self) -> impl Iterator<Item = &str> {
        self.background_order.iter().map(String::as_str)
    }

    pub fn backgrounds_mut(&mut self) -> impl Iterator<Item = &mut Background> {
        self.backgrounds.values_mut()
    }

    /// The currently active background, if any.
    pub fn active_background(&self) -> Option<&str> {
        self.background_ids()
            .find(|id| self.backgrounds.get(*id).is_some_and(|b| b.active))
    }

    /// Serializable copy of the whole model, in declaration order.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            valid: self.valid_signature,
            planet: self.planet.clone(),
            backgrounds: self
                .background_ids()
                .filter_map(|id| {
                    self.backgrounds
                        .get(id)
                        .map(|b| (id.to_string(), b.clone()))
                })
                .collect(),
            objects: self
                .object_ids()
                .filter_map(|id| self.objects.get(id).map(|o| (id.to_string(), o.clone())))
                .collect(),
        }
    }
}

/// Owned, serializable view of a [`SceneModel`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub valid: bool,
    pub planet: Planet,
    pub backgrounds: Vec<(String, Background)>,
    pub objects: Vec<(String, SceneObject)>,
}
