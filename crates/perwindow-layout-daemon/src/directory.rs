//! Keyboard layout directory
//!
//! Hyprland reports layouts by short name (`us,ru`) in the device list, but
//! `activelayout` events carry the full keymap name (`English (US)`), and only
//! for the layout that is currently active. The only way to learn which
//! keymap belongs to which index is to switch to every index in turn and
//! read back what the keyboard reports.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::PipelineError;
use crate::hypr_ipc::{Controller, DevicesResponse, HyprError, Keyboard};

/// Position in the keyboard's configured layout list
pub type LayoutIndex = usize;

/// Layout used for windows that have no remembered layout yet
pub const DEFAULT_LAYOUT: LayoutIndex = 0;

/// Index-aligned keymap names for the main keyboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDirectory {
    names: Vec<String>,
    indices: HashMap<String, LayoutIndex>,
}

impl LayoutDirectory {
    /// Build a directory from keymap names in index order
    ///
    /// If a name appears more than once, the highest index wins.
    pub fn from_names(names: Vec<String>) -> Self {
        let indices = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Self { names, indices }
    }

    /// Probe the controller for the keymap name of every configured layout
    ///
    /// Switches the keyboard through each index, recording the reported
    /// keymap, and finally switches back to the layout that was active
    /// before probing. If that layout cannot be identified, the keyboard is
    /// left on the last probed index.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Discovery` if any controller call fails or the
    /// controller reports no keyboards.
    pub async fn discover<C>(controller: &C) -> Result<Self, PipelineError>
    where
        C: Controller + ?Sized,
    {
        let devices = controller.devices().await.map_err(PipelineError::Discovery)?;
        let (short_names, initial_keymap) = {
            let keyboard = main_keyboard(&devices)?;
            let short_names: Vec<String> =
                keyboard.layouts().into_iter().map(str::to_string).collect();
            (short_names, keyboard.active_keymap.clone())
        };

        debug!(
            layouts = ?short_names,
            active = %initial_keymap,
            "Gathering layout names"
        );

        let mut names = Vec::with_capacity(short_names.len());
        let mut pre_scan_index = None;

        for (index, short_name) in short_names.iter().enumerate() {
            controller
                .switch_layout(index)
                .await
                .map_err(PipelineError::Discovery)?;

            let devices = controller.devices().await.map_err(PipelineError::Discovery)?;
            let keymap = main_keyboard(&devices)?.active_keymap.clone();
            trace!(index, short_name = %short_name, keymap = %keymap, "Probed layout");

            if keymap == initial_keymap {
                pre_scan_index = Some(index);
            }
            names.push(keymap);
        }

        match pre_scan_index {
            Some(index) => {
                controller
                    .switch_layout(index)
                    .await
                    .map_err(PipelineError::Discovery)?;
            }
            None => {
                warn!(
                    keymap = %initial_keymap,
                    "Layout active before discovery is not in the layout list, can't restore it"
                );
            }
        }

        Ok(Self::from_names(names))
    }

    /// Keymap names in index order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn lookup(&self, keymap: &str) -> Option<LayoutIndex> {
        self.indices.get(keymap).copied()
    }

    /// Index for `keymap`, or `DEFAULT_LAYOUT` if it is unknown
    pub fn resolve(&self, keymap: &str) -> LayoutIndex {
        self.lookup(keymap).unwrap_or(DEFAULT_LAYOUT)
    }
}

fn main_keyboard(devices: &DevicesResponse) -> Result<&Keyboard, PipelineError> {
    devices
        .main_keyboard()
        .ok_or(PipelineError::Discovery(HyprError::NoKeyboards))
}
