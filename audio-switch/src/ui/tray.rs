//! System tray icon management.
//!
//! Manages the menu-bar icon, its tooltip and the context menu, and maps
//! menu clicks back to application actions.

use crate::app::Action;
use crate::platform::{IconImage, IconSet, Labels, MenuIconKind, Shortcuts};
use crate::ui::{ActionBindings, TrayView};
use thiserror::Error;
use tray_icon::{
    menu::{
        accelerator::Accelerator, Icon as MenuIcon, IconMenuItem, Menu, MenuEvent, MenuId,
        MenuItem, PredefinedMenuItem,
    },
    Icon, TrayIcon, TrayIconBuilder,
};

/// Tray service error types.
#[derive(Debug, Error)]
pub enum TrayError {
    #[error("Failed to create tray icon: {0}")]
    CreateFailed(String),

    #[error("Failed to load icon resource: {0}")]
    IconLoadFailed(String),

    #[error("Tray icon not initialized")]
    NotInitialized,

    #[error("Failed to create menu: {0}")]
    MenuFailed(String),
}

fn to_tray_icon(image: &IconImage) -> Result<Icon, TrayError> {
    Icon::from_rgba(image.rgba.clone(), image.width, image.height)
        .map_err(|e| TrayError::IconLoadFailed(e.to_string()))
}

fn to_menu_icon(image: &IconImage) -> Result<MenuIcon, TrayError> {
    MenuIcon::from_rgba(image.rgba.clone(), image.width, image.height)
        .map_err(|e| TrayError::IconLoadFailed(e.to_string()))
}

fn accelerator(shortcut: &str) -> Option<Accelerator> {
    match shortcut.parse::<Accelerator>() {
        Ok(accelerator) => Some(accelerator),
        Err(e) => {
            tracing::warn!(shortcut, "Invalid menu accelerator: {}", e);
            None
        }
    }
}

/// System tray manager.
pub struct TrayManager {
    icons: IconSet,
    tray_icon: Option<TrayIcon>,
    menu_actions: ActionBindings<MenuId>,
    mute_item: Option<IconMenuItem>,
    current_device_item: Option<MenuItem>,
}

impl TrayManager {
    /// Create a new TrayManager.
    pub fn new(icons: IconSet) -> Self {
        Self {
            icons,
            tray_icon: None,
            menu_actions: ActionBindings::new(),
            mute_item: None,
            current_device_item: None,
        }
    }

    /// Create and show the tray icon.
    ///
    /// Must run on the main thread after the event loop has started.
    pub fn create(
        &mut self,
        initial: &TrayView,
        labels: &Labels,
        shortcuts: &Shortcuts,
    ) -> Result<(), TrayError> {
        let menu = Menu::new();

        let toggle_item = IconMenuItem::new(
            &labels.toggle_device,
            true,
            Some(to_menu_icon(self.icons.menu(MenuIconKind::Switch))?),
            accelerator(&shortcuts.toggle_device),
        );
        self.menu_actions
            .bind(toggle_item.id().clone(), Action::ToggleDevice);

        let mute_item = IconMenuItem::new(
            &initial.mute_label,
            true,
            Some(to_menu_icon(self.icons.menu(initial.mute_icon))?),
            accelerator(&shortcuts.toggle_mute),
        );
        self.menu_actions
            .bind(mute_item.id().clone(), Action::ToggleMute);

        let current_device_item = MenuItem::new(&initial.current_device_label, false, None);

        menu.append_items(&[
            &toggle_item,
            &mute_item,
            &PredefinedMenuItem::separator(),
            &current_device_item,
            &PredefinedMenuItem::quit(Some(labels.quit.as_str())),
        ])
        .map_err(|e| TrayError::MenuFailed(e.to_string()))?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(to_tray_icon(self.icons.tray(initial.icon))?)
            .with_icon_as_template(true)
            .with_tooltip(&initial.tooltip)
            .with_menu(Box::new(menu))
            .build()
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

        self.tray_icon = Some(tray_icon);
        self.mute_item = Some(mute_item);
        self.current_device_item = Some(current_device_item);

        Ok(())
    }

    /// Render `view` onto the icon and the dynamic menu entries.
    pub fn apply(&mut self, view: &TrayView) -> Result<(), TrayError> {
        let icon = to_tray_icon(self.icons.tray(view.icon))?;
        let mute_icon = to_menu_icon(self.icons.menu(view.mute_icon))?;

        let tray = self.tray_icon.as_ref().ok_or(TrayError::NotInitialized)?;
        tray.set_icon(Some(icon))
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;
        tray.set_icon_as_template(true);
        tray.set_tooltip(Some(&view.tooltip))
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

        if let Some(item) = &self.mute_item {
            item.set_icon(Some(mute_icon));
            item.set_text(&view.mute_label);
        }
        if let Some(item) = &self.current_device_item {
            item.set_text(&view.current_device_label);
        }

        tracing::debug!(icon = ?view.icon, "Tray updated");
        Ok(())
    }

    /// Map a menu click to its action.
    pub fn menu_action(&self, event: &MenuEvent) -> Option<Action> {
        self.menu_actions.lookup(&event.id)
    }

    /// Destroy the tray icon.
    pub fn destroy(&mut self) {
        self.mute_item = None;
        self.current_device_item = None;
        self.tray_icon = None;
        self.menu_actions = ActionBindings::new();
    }
}
