use crate::critter::Critter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-unique entity id handed out by the owning world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThingId(pub u64);

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of entity kinds that can live in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThingKind {
    /// Hard inert obstacle.
    Clod,
    /// Soft plant-like resource.
    Plasmoid,
    /// Critter that feels textures and eats plasmoids.
    Diskoid,
    /// Critter that hears feeding and eats diskoids.
    Pentoid,
}

impl ThingKind {
    pub const ALL: [ThingKind; 4] = [
        ThingKind::Clod,
        ThingKind::Plasmoid,
        ThingKind::Diskoid,
        ThingKind::Pentoid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThingKind::Clod => "Clod",
            ThingKind::Plasmoid => "Plasmoid",
            ThingKind::Diskoid => "Diskoid",
            ThingKind::Pentoid => "Pentoid",
        }
    }

    pub fn texture(self) -> Texture {
        match self {
            ThingKind::Clod => Texture::Hard,
            ThingKind::Plasmoid => Texture::Soft,
            ThingKind::Diskoid | ThingKind::Pentoid => Texture::Empty,
        }
    }

    /// Whether things of this kind block movement and spawning.
    pub fn is_solid(self) -> bool {
        matches!(self, ThingKind::Clod)
    }

    /// Whether the kind has strength, age and a life state.
    pub fn is_organism(self) -> bool {
        !matches!(self, ThingKind::Clod)
    }

    pub fn is_critter(self) -> bool {
        matches!(self, ThingKind::Diskoid | ThingKind::Pentoid)
    }

    /// Kind this critter kind feeds on.
    pub fn food(self) -> Option<ThingKind> {
        match self {
            ThingKind::Diskoid => Some(ThingKind::Plasmoid),
            ThingKind::Pentoid => Some(ThingKind::Diskoid),
            ThingKind::Clod | ThingKind::Plasmoid => None,
        }
    }
}

impl fmt::Display for ThingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Surface texture a feeler can detect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Texture {
    Empty,
    Hard,
    Soft,
}

impl Texture {
    pub fn label(self) -> &'static str {
        match self {
            Texture::Empty => "empty",
            Texture::Hard => "hard",
            Texture::Soft => "soft",
        }
    }
}

/// Strength, age and life state shared by every organism.
#[derive(Clone, Debug, PartialEq)]
pub struct Vitals {
    pub strength: f64,
    pub age: u64,
    alive: bool,
}

impl Vitals {
    pub fn new(strength: f64) -> Self {
        Self {
            strength,
            age: 0,
            alive: true,
        }
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Flag the organism for removal at the next sweep. Returns `true` only on
    /// the transition from alive to dead.
    pub fn die(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    pub fn change_strength(&mut self, amount: f64) {
        self.strength += amount;
        if self.strength <= 0.0 {
            self.die();
        }
    }
}

/// Kind-specific payload of a [`Thing`].
#[derive(Clone, Debug)]
pub enum ThingBody {
    Clod,
    Plasmoid(Vitals),
    Critter(Box<Critter>),
}

/// An entity owned by the world.
#[derive(Clone, Debug)]
pub struct Thing {
    pub id: ThingId,
    pub kind: ThingKind,
    pub position: [f64; 2],
    pub radius: f64,
    pub texture: Texture,
    /// Whether the thing blocks movement.
    pub solid: bool,
    pub body: ThingBody,
}

impl Thing {
    pub fn vitals(&self) -> Option<&Vitals> {
        match &self.body {
            ThingBody::Clod => None,
            ThingBody::Plasmoid(vitals) => Some(vitals),
            ThingBody::Critter(critter) => Some(&critter.vitals),
        }
    }

    pub fn vitals_mut(&mut self) -> Option<&mut Vitals> {
        match &mut self.body {
            ThingBody::Clod => None,
            ThingBody::Plasmoid(vitals) => Some(vitals),
            ThingBody::Critter(critter) => Some(&mut critter.vitals),
        }
    }

    /// Inert things never die.
    pub fn alive(&self) -> bool {
        self.vitals().is_none_or(Vitals::alive)
    }

    pub fn critter(&self) -> Option<&Critter> {
        match &self.body {
            ThingBody::Critter(critter) => Some(critter.as_ref()),
            _ => None,
        }
    }

    pub fn critter_mut(&mut self) -> Option<&mut Critter> {
        match &mut self.body {
            ThingBody::Critter(critter) => Some(critter.as_mut()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_transitions_once() {
        let mut v = Vitals::new(10.0);
        assert!(v.die());
        assert!(!v.die());
        assert!(!v.alive());
    }

    #[test]
    fn strength_at_zero_kills() {
        let mut v = Vitals::new(3.0);
        v.change_strength(-2.0);
        assert!(v.alive());
        v.change_strength(-1.0);
        assert!(!v.alive());
    }

    #[test]
    fn food_chain_matches_kinds() {
        assert_eq!(ThingKind::Diskoid.food(), Some(ThingKind::Plasmoid));
        assert_eq!(ThingKind::Pentoid.food(), Some(ThingKind::Diskoid));
        assert_eq!(ThingKind::Clod.food(), None);
        assert!(!ThingKind::Clod.is_organism());
        assert_eq!(ThingKind::Clod.texture(), Texture::Hard);
    }
}
