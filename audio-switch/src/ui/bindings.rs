//! Event-id to action lookup.
//!
//! Menu items and global shortcuts both come back from the OS as opaque
//! ids; the tray and the hotkey manager keep one of these tables each.

use crate::app::Action;

/// Ids bound to actions, in registration order.
#[derive(Debug, Clone)]
pub struct ActionBindings<K> {
    bindings: Vec<(K, Action)>,
}

impl<K> Default for ActionBindings<K> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<K: PartialEq> ActionBindings<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: K, action: Action) {
        self.bindings.push((key, action));
    }

    /// The action bound to `key`. The first binding wins.
    pub fn lookup(&self, key: &K) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == key)
            .map(|(_, action)| *action)
    }

    /// Like [`lookup`](Self::lookup), but only key-down events trigger.
    pub fn on_press(&self, key: &K, pressed: bool) -> Option<Action> {
        if !pressed {
            return None;
        }
        self.lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> ActionBindings<u32> {
        let mut bindings = ActionBindings::new();
        bindings.bind(7, Action::ToggleDevice);
        bindings.bind(9, Action::ToggleMute);
        bindings
    }

    #[test]
    fn test_lookup_maps_ids_to_actions() {
        let bindings = bindings();

        assert_eq!(bindings.lookup(&7), Some(Action::ToggleDevice));
        assert_eq!(bindings.lookup(&9), Some(Action::ToggleMute));
        assert_eq!(bindings.lookup(&8), None);
    }

    #[test]
    fn test_releases_do_not_trigger() {
        let bindings = bindings();

        assert_eq!(bindings.on_press(&9, true), Some(Action::ToggleMute));
        assert_eq!(bindings.on_press(&9, false), None);
        assert_eq!(bindings.on_press(&8, true), None);
    }

    #[test]
    fn test_string_ids_first_binding_wins() {
        let mut bindings = ActionBindings::new();
        bindings.bind("switch".to_string(), Action::ToggleDevice);
        bindings.bind("switch".to_string(), Action::ToggleMute);

        assert_eq!(bindings.lookup(&"switch".to_string()), Some(Action::ToggleDevice));
        assert_eq!(bindings.lookup(&String::new()), None);
    }
}
