use serde::{Deserialize, Serialize};

/// Transient noise left behind by a feeding critter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub position: [f64; 2],
    /// Ticks since the sound was made.
    pub age: u32,
}

impl Sound {
    pub fn new(position: [f64; 2]) -> Self {
        Self { position, age: 0 }
    }
}

/// Age every sound by one tick and drop those that reached `horizon`.
pub fn age_sounds(sounds: &mut Vec<Sound>, horizon: u32) {
    for sound in sounds.iter_mut() {
        sound.age = sound.age.saturating_add(1);
    }
    sounds.retain(|s| s.age < horizon);
}
