use crate::thing::{ThingId, ThingKind};
use serde::{Deserialize, Serialize};

/// Change notifications for presentation layers, drained with
/// `World::drain_events` when `SimConfig::record_events` is on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    Spawned {
        id: ThingId,
        kind: ThingKind,
        position: [f64; 2],
        /// Set for critters.
        heading: Option<f64>,
    },
    Moved {
        id: ThingId,
        position: [f64; 2],
    },
    Turned {
        id: ThingId,
        heading: f64,
    },
    Removed {
        id: ThingId,
        kind: ThingKind,
    },
    /// Everything was removed ahead of repopulation.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let event = WorldEvent::Removed {
            id: ThingId(7),
            kind: ThingKind::Plasmoid,
        };
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({"event": "removed", "id": 7, "kind": "plasmoid"})
        );
        let reset = serde_json::to_value(WorldEvent::Reset).expect("serializable");
        assert_eq!(reset, serde_json::json!({"event": "reset"}));
    }
}
