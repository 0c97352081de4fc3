//! Entity-name bindings and click flags.
//!
//! Both live for the whole interpreter lifetime. Bindings are never cleared
//! by a parse; click flags are.

use std::collections::HashMap;

/// Entity name -> PlanetLang id, in first-bind order.
///
/// Rebinding a name replaces its id in place, so the name keeps its
/// original position for reverse lookups.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    entries: Vec<(String, String)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `entity` to `id`. Returns the id it was previously bound to.
    pub fn bind(&mut self, entity: &str, id: &str) -> Option<String> {
        match self.entries.iter_mut().find(|(name, _)| name == entity) {
            Some((_, bound)) => Some(std::mem::replace(bound, id.to_string())),
            None => {
                self.entries.push((entity.to_string(), id.to_string()));
                None
            }
        }
    }

    /// Id bound to an entity name.
    pub fn id_for(&self, entity: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, id)| id.as_str())
    }

    /// First entity name bound to `id`.
    pub fn entity_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, bound)| bound == id)
            .map(|(name, _)| name.as_str())
    }

    /// Every entity name bound to `id`.
    pub fn entities_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, bound)| bound == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), i.as_str()))
    }
}

/// Per-id "was clicked" flags.
#[derive(Debug, Default, Clone)]
pub struct ClickState {
    flags: HashMap<String, bool>,
}

impl ClickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag for `id` back to false (used when an entity is bound).
    pub fn seed(&mut self, id: &str) {
        self.flags.insert(id.to_string(), false);
    }

    pub fn mark(&mut self, id: &str) {
        self.flags.insert(id.to_string(), true);
    }

    /// Unknown ids read as not clicked.
    pub fn was_clicked(&self, id: &str) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_bind_wins() {
        let mut bindings = Bindings::new();
        assert_eq!(bindings.bind("SpriteA", "obj1"), None);
        assert_eq!(bindings.bind("SpriteA", "obj2"), Some("obj1".to_string()));

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.id_for("SpriteA"), Some("obj2"));
        assert_eq!(bindings.entity_for("obj1"), None);
        assert_eq!(bindings.entity_for("obj2"), Some("SpriteA"));
    }

    #[test]
    fn test_many_to_one_returns_first_name() {
        let mut bindings = Bindings::new();
        bindings.bind("First", "rock");
        bindings.bind("Second", "rock");

        assert_eq!(bindings.entity_for("rock"), Some("First"));
        assert_eq!(bindings.entities_for("rock").collect::<Vec<_>>(), vec!["First", "Second"]);
    }

    #[test]
    fn test_click_flags() {
        let mut clicks = ClickState::new();
        assert!(!clicks.was_clicked("coin"));

        clicks.mark("coin");
        assert!(clicks.was_clicked("coin"));

        clicks.seed("coin");
        assert!(!clicks.was_clicked("coin"));

        clicks.mark("coin");
        clicks.clear();
        assert!(!clicks.was_clicked("coin"));
    }
}
