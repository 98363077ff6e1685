//! Controller response types
//!
//! Only the fields the daemon needs are deserialized from
//! `hyprctl devices -j`; everything else in the response is ignored.

use serde::Deserialize;

/// A keyboard as reported by `hyprctl devices -j`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Keyboard {
    #[serde(default)]
    pub name: String,

    /// Configured layout short names, comma separated (e.g. `"us,ru"`)
    #[serde(default)]
    pub layout: String,

    /// Full name of the currently active keymap (e.g. `"English (US)"`)
    #[serde(default)]
    pub active_keymap: String,

    #[serde(default)]
    pub main: bool,
}

impl Keyboard {
    /// Configured layout short names in index order
    pub fn layouts(&self) -> Vec<&str> {
        self.layout.split(',').collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub keyboards: Vec<Keyboard>,
}

impl DevicesResponse {
    /// The keyboard flagged `main`, or the first keyboard if none is
    pub fn main_keyboard(&self) -> Option<&Keyboard> {
        self.keyboards
            .iter()
            .find(|kb| kb.main)
            .or_else(|| self.keyboards.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES_JSON: &str = r#"{
        "mice": [{"address": "0x1", "name": "mouse", "defaultSpeed": 0.0}],
        "keyboards": [
            {
                "address": "0x55d0",
                "name": "power-button",
                "rules": "",
                "model": "",
                "layout": "us",
                "variant": "",
                "options": "",
                "active_keymap": "English (US)",
                "capsLock": false,
                "numLock": false,
                "main": false
            },
            {
                "address": "0x55d1",
                "name": "at-translated-set-2-keyboard",
                "rules": "",
                "model": "",
                "layout": "us,ru,de",
                "variant": ",,",
                "options": "grp:alt_shift_toggle",
                "active_keymap": "Russian",
                "capsLock": false,
                "numLock": true,
                "main": true
            }
        ],
        "tablets": [],
        "touch": [],
        "switches": []
    }"#;

    #[test]
    fn test_deserialize_devices_response() {
        let response: DevicesResponse = serde_json::from_str(DEVICES_JSON).unwrap();
        assert_eq!(response.keyboards.len(), 2);

        let main = response.main_keyboard().unwrap();
        assert_eq!(main.name, "at-translated-set-2-keyboard");
        assert_eq!(main.active_keymap, "Russian");
        assert_eq!(main.layouts(), vec!["us", "ru", "de"]);
    }

    #[test]
    fn test_main_keyboard_falls_back_to_first() {
        let response: DevicesResponse = serde_json::from_str(
            r#"{"keyboards": [
                {"name": "a", "layout": "us", "active_keymap": "English (US)"},
                {"name": "b", "layout": "de", "active_keymap": "German"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(response.main_keyboard().unwrap().name, "a");
    }

    #[test]
    fn test_no_keyboards() {
        let response: DevicesResponse = serde_json::from_str(r#"{"mice": []}"#).unwrap();
        assert!(response.main_keyboard().is_none());
    }

    #[test]
    fn test_empty_layout_gives_one_entry() {
        let keyboard = Keyboard {
            name: "kb".to_string(),
            layout: String::new(),
            active_keymap: String::new(),
            main: true,
        };
        assert_eq!(keyboard.layouts(), vec![""]);
    }
}
