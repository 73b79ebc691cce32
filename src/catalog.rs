//! The fixed set of collectibles the machine can dispense.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::SessionError;

pub const COST_PER_PLAY: u64 = 100;
pub const STARTING_BALANCE: u64 = 1000;
pub const STARTING_CAPSULES: u32 = 15;

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct DollId(pub u8);

impl fmt::Display for DollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One catalog entry. Entries are `'static` and never mutated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Doll {
    pub id: DollId,
    pub name: &'static str,
    pub image: &'static str,
    /// `#RRGGBB`
    pub color: &'static str,
}

impl Doll {
    /// Decodes the display colour into RGB components.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(self.color)
    }
}

impl fmt::Display for Doll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const DOLLS: [Doll; 5] = [
    Doll {
        id: DollId(1),
        name: "Rabbit",
        image: "https://assets.codepen.io/2509128/prize1.png",
        color: "#FFC0CB",
    },
    Doll {
        id: DollId(2),
        name: "Teddy Bear",
        image: "https://assets.codepen.io/2509128/prize2.png",
        color: "#8B4513",
    },
    Doll {
        id: DollId(3),
        name: "Polar Bear",
        image: "https://assets.codepen.io/2509128/prize3.png",
        color: "#87CEEB",
    },
    Doll {
        id: DollId(4),
        name: "Snicker Capoo",
        image: "https://s1.locimg.com/2024/09/16/4168b14530709.png",
        color: "#DDA0DD",
    },
    Doll {
        id: DollId(5),
        name: "Mystery Doll",
        image: "https://s1.locimg.com/2024/09/16/7bba07658b7b1.png",
        color: "#A9A9A9",
    },
];

pub fn all() -> &'static [Doll] {
    &DOLLS
}

pub fn get(id: DollId) -> Result<&'static Doll, SessionError> {
    DOLLS
        .iter()
        .find(|d| d.id == id)
        .ok_or(SessionError::UnknownDoll(id.0))
}

pub fn parse_hex_color(raw: &str) -> Option<(u8, u8, u8)> {
    let digits = raw.strip_prefix('#')?;
    let bytes = hex::decode(digits).ok()?;
    match bytes.as_slice() {
        [r, g, b] => Some((*r, *g, *b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = DOLLS.iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DOLLS.len());
    }

    #[test]
    fn every_color_decodes() {
        for doll in all() {
            assert!(doll.rgb().is_some(), "bad colour for {}", doll.name);
        }
        assert_eq!(DOLLS[0].rgb(), Some((0xFF, 0xC0, 0xCB)));
    }

    #[test]
    fn parse_hex_color_rejects_malformed_input() {
        assert_eq!(parse_hex_color("FFC0CB"), None);
        assert_eq!(parse_hex_color("#FFC0"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(get(DollId(3)).map(|d| d.name), Ok("Polar Bear"));
        assert_eq!(get(DollId(9)), Err(SessionError::UnknownDoll(9)));
    }
}
