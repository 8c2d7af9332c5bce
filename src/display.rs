use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Font {
    Bold,
    Medium,
}

/// A `label: value` pair drawn at a fixed position on the status surface.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
    pub position: (u32, u32),
    pub label_font: Font,
    pub text_font: Font,
}

#[derive(Debug, PartialEq)]
pub enum DisplayError {
    ElementNotFound(String),
}

impl Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&match self {
            DisplayError::ElementNotFound(key) => format!("display element \"{}\" is not registered", key),
        })
    }
}

impl std::error::Error for DisplayError {}

/// The host's status display. Rendering is the host's business; plugins only
/// register elements and push values into them.
///
/// The host shares the surface behind a `parking_lot::Mutex`. Element
/// registration and removal happen under that lock, per-tick updates get a
/// surface the refresh loop has already locked.
pub trait StatusSurface {
    fn width(&self) -> u32;
    fn add_element(&mut self, key: &str, element: LabeledValue);
    fn remove_element(&mut self, key: &str) -> Result<(), DisplayError>;
    fn set(&mut self, key: &str, value: String);
    /// Redraws the surface. `force` redraws even if nothing changed, `new_data`
    /// is applied to the named slots first.
    fn update(&mut self, force: bool, new_data: &[(&str, &str)]);
}

/// Headless surface that reports changes through the log.
pub struct ConsoleSurface {
    width: u32,
    elements: HashMap<String, LabeledValue>,
    status: HashMap<String, String>,
    dirty: bool,
}

impl ConsoleSurface {
    pub fn new(width: u32) -> Self {
        ConsoleSurface {
            width,
            elements: HashMap::new(),
            status: HashMap::new(),
            dirty: false,
        }
    }
}

impl StatusSurface for ConsoleSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn add_element(&mut self, key: &str, element: LabeledValue) {
        if self.elements.insert(key.to_string(), element).is_some() {
            warn!("Display element \"{}\" was registered twice, replacing it", key);
        }
        self.dirty = true;
    }

    fn remove_element(&mut self, key: &str) -> Result<(), DisplayError> {
        match self.elements.remove(key) {
            Some(_) => {
                self.dirty = true;
                Ok(())
            }
            None => Err(DisplayError::ElementNotFound(key.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: String) {
        match self.elements.get_mut(key) {
            Some(element) => {
                if element.value != value {
                    element.value = value;
                    self.dirty = true;
                }
            }
            None => {
                self.status.insert(key.to_string(), value);
                self.dirty = true;
            }
        }
    }

    fn update(&mut self, force: bool, new_data: &[(&str, &str)]) {
        for (key, value) in new_data {
            self.set(key, value.to_string());
        }

        if !force && !self.dirty {
            return;
        }

        let mut keys: Vec<&String> = self.elements.keys().collect();
        keys.sort();
        for key in keys {
            let element = &self.elements[key];
            info!("{} {}", element.label, element.value);
        }

        if let Some(status) = self.status.get("status") {
            info!("status: {}", status);
        }

        self.dirty = false;
    }
}
