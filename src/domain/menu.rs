//! Interactive selector: a table mapping choice keys to actions.

use crate::domain::error::LeanboxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    RunBacktest(String),
    ListGenerated,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub key: String,
    pub label: String,
    pub action: MenuAction,
}

impl MenuEntry {
    pub fn new(key: &str, label: &str, action: MenuAction) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            action,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Self { entries }
    }

    /// The stock four-choice menu.
    pub fn standard() -> Self {
        Self::new(vec![
            MenuEntry::new(
                "1",
                "Simple Buy and Hold (SPY)",
                MenuAction::RunBacktest("SimpleBuyAndHold".into()),
            ),
            MenuEntry::new(
                "2",
                "Momentum Strategy (SPY)",
                MenuAction::RunBacktest("DemoMomentumStrategy".into()),
            ),
            MenuEntry::new("3", "List generated strategies", MenuAction::ListGenerated),
            MenuEntry::new("4", "Exit", MenuAction::Exit),
        ])
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn select(&self, input: &str) -> Result<&MenuAction, LeanboxError> {
        let key = input.trim();
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.action)
            .ok_or_else(|| LeanboxError::InvalidChoice {
                input: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn standard_menu_maps_choices() {
        let menu = Menu::standard();
        assert_eq!(
            menu.select("1").unwrap(),
            &MenuAction::RunBacktest("SimpleBuyAndHold".into())
        );
        assert_eq!(
            menu.select("2\n").unwrap(),
            &MenuAction::RunBacktest("DemoMomentumStrategy".into())
        );
        assert_eq!(menu.select(" 3 ").unwrap(), &MenuAction::ListGenerated);
        assert_eq!(menu.select("4").unwrap(), &MenuAction::Exit);
    }

    #[test]
    fn unknown_choice_is_invalid() {
        let err = Menu::standard().select("9").unwrap_err();
        assert!(matches!(err, LeanboxError::InvalidChoice { ref input } if input == "9"));
        assert!(err.to_string().contains("Invalid choice"));
    }

    #[test]
    fn custom_table() {
        let menu = Menu::new(vec![
            MenuEntry::new("a", "Alpha", MenuAction::RunBacktest("Alpha".into())),
            MenuEntry::new("q", "Quit", MenuAction::Exit),
        ]);
        assert_eq!(menu.select("q").unwrap(), &MenuAction::Exit);
        assert!(menu.select("1").is_err());
    }

    proptest! {
        #[test]
        fn anything_outside_the_table_is_rejected(input in "[0-9a-z]{1,4}") {
            let menu = Menu::standard();
            let known = ["1", "2", "3", "4"].contains(&input.as_str());
            prop_assert_eq!(menu.select(&input).is_ok(), known);
        }
    }
}
