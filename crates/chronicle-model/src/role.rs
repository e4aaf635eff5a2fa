use serde::{Deserialize, Deserializer, Serialize};

use crate::id::Id;

/// A 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn r(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub fn g(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn b(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn to_hex(self) -> String {
        format!("#{:06X}", self.0 & 0xFF_FF_FF)
    }

    pub fn to_rgb(self) -> String {
        format!("rgb({}, {}, {})", self.r(), self.g(), self.b())
    }
}

/// A guild role. Roles carry display colour and ordering used when rendering
/// message authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    pub name: String,
    // The upstream uses colour value 0 to mean "no colour set".
    #[serde(default, deserialize_with = "nullable_color")]
    pub color: Option<Color>,
    #[serde(default)]
    pub position: i32,
}

pub(crate) fn nullable_color<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<u32>::deserialize(deserializer)?;
    Ok(raw.filter(|&v| v != 0).map(Color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_color_is_none() {
        let role: Role =
            serde_json::from_str(r#"{"id":"1","name":"everyone","color":0,"position":0}"#).unwrap();
        assert_eq!(role.color, None);
    }

    #[test]
    fn nonzero_color_preserved() {
        let role: Role =
            serde_json::from_str(r#"{"id":"1","name":"admin","color":16711680,"position":5}"#)
                .unwrap();
        let color = role.color.unwrap();
        assert_eq!(color.to_hex(), "#FF0000");
        assert_eq!((color.r(), color.g(), color.b()), (255, 0, 0));
    }
}
