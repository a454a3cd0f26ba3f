//! Card objects and their visual skin.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::domain::Person;

use crate::{Transform, Vec3};

/// Cards per row of the default table; the pool never shrinks below
/// `row_count * TABLE_MIN_COLUMNS` so the table always looks full.
pub const TABLE_MIN_COLUMNS: usize = 7;
pub const SCATTER_EXTENT: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinMode {
    Default,
    Sphere,
    Lucky,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: 1.0,
        })
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub card_color: String,
    pub pattern_color: String,
    pub lucky_color: String,
    pub text_color: String,
    pub text_size: f64,
    /// 1-based card numbers drawn in `pattern_color` on the table.
    pub pattern_list: Vec<usize>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            card_color: "#ff79c6".into(),
            pattern_color: "#1b66c9".into(),
            lucky_color: "#ecb1ac".into(),
            text_color: "#ffffff".into(),
            text_size: 30.0,
            pattern_list: Vec::new(),
        }
    }
}

impl Palette {
    fn color(raw: &str) -> Color {
        Color::from_hex(raw).unwrap_or(Color::WHITE)
    }

    pub fn card(&self) -> Color {
        Self::color(&self.card_color)
    }

    pub fn pattern(&self) -> Color {
        Self::color(&self.pattern_color)
    }

    pub fn lucky(&self) -> Color {
        Self::color(&self.lucky_color)
    }

    pub fn is_pattern_card(&self, index: usize) -> bool {
        self.pattern_list.contains(&(index + 1))
    }

    pub fn background(&self, index: usize, mode: SkinMode, alpha: f32) -> Color {
        match mode {
            SkinMode::Lucky => self.lucky().with_alpha(alpha),
            SkinMode::Default if self.is_pattern_card(index) => self.pattern().with_alpha(alpha),
            SkinMode::Default | SkinMode::Sphere => self.card().with_alpha(alpha),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFace {
    pub uid: String,
    pub name: String,
    pub detail: String,
}

impl From<&Person> for CardFace {
    fn from(person: &Person) -> Self {
        Self {
            uid: person.uid.clone(),
            name: person.name.clone(),
            detail: person.masked_phone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardSkin {
    pub person_id: Option<u64>,
    pub face: Option<CardFace>,
    pub mode: SkinMode,
    pub background: Color,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardObject {
    index: usize,
    pub transform: Transform,
    pub skin: CardSkin,
}

impl CardObject {
    pub fn new(index: usize, transform: Transform, palette: &Palette) -> Self {
        Self {
            index,
            transform,
            skin: CardSkin {
                person_id: None,
                face: None,
                mode: SkinMode::Default,
                background: palette.background(index, SkinMode::Default, 1.0),
                scale: 1.0,
            },
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Rebinds the card to `person` (or blanks it) and restyles it.
    pub fn assign(
        &mut self,
        person: Option<&Person>,
        palette: &Palette,
        mode: SkinMode,
        scale: f64,
        alpha: f32,
    ) {
        self.skin.person_id = person.map(|p| p.id);
        self.skin.face = person.map(CardFace::from);
        self.restyle(palette, mode, scale, alpha);
    }

    /// Changes the look without touching who the card shows.
    pub fn restyle(&mut self, palette: &Palette, mode: SkinMode, scale: f64, alpha: f32) {
        self.skin.mode = mode;
        self.skin.scale = scale;
        self.skin.background = palette.background(self.index, mode, alpha);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Camera {
    pub const HOME: Vec3 = Vec3::new(0.0, 0.0, 3000.0);
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Self::HOME,
            rotation: Vec3::ZERO,
        }
    }
}

/// The card pool. Cards are only created by [`Scene::populate`] and only
/// removed by [`Scene::clear`].
#[derive(Debug, Clone, Default)]
pub struct Scene {
    cards: Vec<CardObject>,
    pub rotation: Vec3,
    pub camera: Camera,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pool with one card per roster entry, scattered at random.
    pub fn populate(&mut self, roster: &[Option<Person>], palette: &Palette, rng: &mut impl Rng) {
        self.cards = roster
            .iter()
            .enumerate()
            .map(|(index, person)| {
                let position = Vec3::new(
                    rng.gen_range(-SCATTER_EXTENT..SCATTER_EXTENT),
                    rng.gen_range(-SCATTER_EXTENT..SCATTER_EXTENT),
                    rng.gen_range(-SCATTER_EXTENT..SCATTER_EXTENT),
                );
                let mut card = CardObject::new(index, Transform::at(position), palette);
                card.assign(person.as_ref(), palette, SkinMode::Default, 1.0, 1.0);
                card
            })
            .collect();
        self.rotation = Vec3::ZERO;
        self.camera = Camera::default();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[CardObject] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&CardObject> {
        self.cards.get(index)
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut CardObject> {
        self.cards.get_mut(index)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.rotation = Vec3::ZERO;
        self.camera = Camera::default();
    }
}

/// Who each table card shows at start-up. People are cycled until the table
/// holds at least `row_count * TABLE_MIN_COLUMNS` cards; with nobody to show,
/// the cards stay blank.
pub fn table_roster(people: &[Person], row_count: usize) -> Vec<Option<Person>> {
    let len = people.len().max(row_count.max(1) * TABLE_MIN_COLUMNS);
    if people.is_empty() {
        return vec![None; len];
    }
    people.iter().cycle().take(len).cloned().map(Some).collect()
}

#[cfg(test)]
#[path = "tests/card_tests.rs"]
mod tests;
