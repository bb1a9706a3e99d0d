//! Title, settings and game-over menus

use crate::settings::Settings;
use falling_bricks::GameMode;

/// Menu screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Title,
    Settings,
    GameOver,
}

/// Menu state
#[derive(Debug, Clone)]
pub struct Menu {
    pub screen: MenuScreen,
    pub selected: usize,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub item_type: MenuItemType,
}

#[derive(Debug, Clone)]
pub enum MenuItemType {
    /// Simple button that triggers an action
    Button(MenuAction),
    /// Toggle boolean setting
    Toggle { key: SettingKey, value: bool },
    /// Cycle through options
    Cycle {
        key: SettingKey,
        options: Vec<String>,
        current: usize,
    },
    /// Numeric value with increment/decrement
    Number {
        key: SettingKey,
        value: u32,
        max: u32,
        step: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame(GameMode),
    GoToScreen(MenuScreen),
    /// Leave the game-over screen for the title menu
    MainMenu,
    SaveSettings,
    Quit,
}

/// Setting keys for identifying which setting to modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ShowShadow,
    ShowGridLines,
    BlockStyle,
    MusicVolume,
    SoundVolume,
}

const BLOCK_STYLES: [&str; 3] = ["solid", "bracket", "round"];

fn button(label: &str, action: MenuAction) -> MenuItem {
    MenuItem {
        label: label.to_string(),
        item_type: MenuItemType::Button(action),
    }
}

impl Menu {
    pub fn title() -> Self {
        let mut items: Vec<MenuItem> = GameMode::all()
            .iter()
            .map(|&mode| button(mode.name(), MenuAction::StartGame(mode)))
            .collect();
        items.push(button(
            "Settings",
            MenuAction::GoToScreen(MenuScreen::Settings),
        ));
        items.push(button("Quit", MenuAction::Quit));

        Self {
            screen: MenuScreen::Title,
            selected: 0,
            items,
        }
    }

    pub fn settings(settings: &Settings) -> Self {
        let style = BLOCK_STYLES
            .iter()
            .position(|&s| s == settings.visual.block_style)
            .unwrap_or(0);

        Self {
            screen: MenuScreen::Settings,
            selected: 0,
            items: vec![
                MenuItem {
                    label: "Show Shadow".to_string(),
                    item_type: MenuItemType::Toggle {
                        key: SettingKey::ShowShadow,
                        value: settings.visual.show_shadow,
                    },
                },
                MenuItem {
                    label: "Grid Lines".to_string(),
                    item_type: MenuItemType::Toggle {
                        key: SettingKey::ShowGridLines,
                        value: settings.visual.show_grid_lines,
                    },
                },
                MenuItem {
                    label: "Block Style".to_string(),
                    item_type: MenuItemType::Cycle {
                        key: SettingKey::BlockStyle,
                        options: BLOCK_STYLES.iter().map(|s| s.to_string()).collect(),
                        current: style,
                    },
                },
                MenuItem {
                    label: "Music Volume".to_string(),
                    item_type: MenuItemType::Number {
                        key: SettingKey::MusicVolume,
                        value: settings.audio.music_volume,
                        max: 100,
                        step: 5,
                    },
                },
                MenuItem {
                    label: "Sound Volume".to_string(),
                    item_type: MenuItemType::Number {
                        key: SettingKey::SoundVolume,
                        value: settings.audio.sound_volume,
                        max: 100,
                        step: 5,
                    },
                },
                button("Save", MenuAction::SaveSettings),
                button("Back", MenuAction::GoToScreen(MenuScreen::Title)),
            ],
        }
    }

    pub fn game_over() -> Self {
        Self {
            screen: MenuScreen::GameOver,
            selected: 0,
            items: vec![
                button("Main Menu", MenuAction::MainMenu),
                button("Quit", MenuAction::Quit),
            ],
        }
    }

    /// Build the menu for a screen
    pub fn go_to(screen: MenuScreen, settings: &Settings) -> Self {
        match screen {
            MenuScreen::Title => Self::title(),
            MenuScreen::Settings => Self::settings(settings),
            MenuScreen::GameOver => Self::game_over(),
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }

    /// Handle left/right for toggles, cycling options and numbers
    pub fn adjust(&mut self, forward: bool, settings: &mut Settings) {
        let Some(item) = self.items.get_mut(self.selected) else {
            return;
        };
        match &mut item.item_type {
            MenuItemType::Toggle { key, value } => {
                *value = !*value;
                apply_toggle(settings, *key, *value);
            }
            MenuItemType::Cycle {
                key,
                options,
                current,
            } => {
                let len = options.len();
                *current = if forward {
                    (*current + 1) % len
                } else {
                    (*current + len - 1) % len
                };
                apply_choice(settings, *key, &options[*current]);
            }
            MenuItemType::Number {
                key,
                value,
                max,
                step,
            } => {
                *value = if forward {
                    (*value + *step).min(*max)
                } else {
                    value.saturating_sub(*step)
                };
                apply_number(settings, *key, *value);
            }
            MenuItemType::Button(_) => {}
        }
    }

    pub fn select(&self) -> Option<MenuAction> {
        match self.items.get(self.selected)?.item_type {
            MenuItemType::Button(action) => Some(action),
            _ => None,
        }
    }
}

fn apply_toggle(settings: &mut Settings, key: SettingKey, value: bool) {
    match key {
        SettingKey::ShowShadow => settings.visual.show_shadow = value,
        SettingKey::ShowGridLines => settings.visual.show_grid_lines = value,
        _ => {}
    }
}

fn apply_choice(settings: &mut Settings, key: SettingKey, value: &str) {
    if key == SettingKey::BlockStyle {
        settings.visual.block_style = value.to_string();
    }
}

fn apply_number(settings: &mut Settings, key: SettingKey, value: u32) {
    match key {
        SettingKey::MusicVolume => settings.audio.music_volume = value,
        SettingKey::SoundVolume => settings.audio.sound_volume = value,
        _ => {}
    }
}

/// Display text for the value part of a menu item
pub fn item_value(item: &MenuItem) -> Option<String> {
    match &item.item_type {
        MenuItemType::Button(_) => None,
        MenuItemType::Toggle { value, .. } => Some(if *value { "On" } else { "Off" }.to_string()),
        MenuItemType::Cycle {
            options, current, ..
        } => options.get(*current).cloned(),
        MenuItemType::Number { value, .. } => Some(format!("{}%", value)),
    }
}
