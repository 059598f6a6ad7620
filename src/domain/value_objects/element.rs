//! Esprit elements

use serde::{Deserialize, Serialize};

/// The six elements an esprit species can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Element {
    Inferno,
    Verdant,
    Abyssal,
    Tempest,
    Umbral,
    Radiant,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::Inferno,
        Element::Verdant,
        Element::Abyssal,
        Element::Tempest,
        Element::Umbral,
        Element::Radiant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inferno => "Inferno",
            Self::Verdant => "Verdant",
            Self::Abyssal => "Abyssal",
            Self::Tempest => "Tempest",
            Self::Umbral => "Umbral",
            Self::Radiant => "Radiant",
        }
    }

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|element| element.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown element: {}", s))
    }
}

impl TryFrom<String> for Element {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Element> for String {
    fn from(element: Element) -> String {
        element.as_str().to_string()
    }
}
