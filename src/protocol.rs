use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Item;
use crate::geometry::Point;
use crate::playground::{MergeEvent, SurfaceSnapshot, TokenHandle};

/// Only plain-text drops carry item payloads
pub const TEXT_PLAIN: &str = "text/plain";

// ============================================================================
// Drop Transport
// ============================================================================

/// Payload attached to an inventory drag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPayload {
    pub item: Item,
    #[serde(rename = "isDragAndDrop", default)]
    pub is_drag_and_drop: bool,
}

impl DropPayload {
    /// Payload for an item dragged out of the inventory list
    pub fn for_inventory(item: Item) -> Self {
        Self {
            item,
            is_drag_and_drop: true,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A drop delivered by the host UI
#[derive(Debug, Clone)]
pub struct DropEvent {
    pub mime_type: String,
    pub text: String,
    pub position: Point,
}

impl DropEvent {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            mime_type: TEXT_PLAIN.to_string(),
            text: text.into(),
            position,
        }
    }

    /// Decoded payload, or `None` for drops that aren't ours
    pub fn payload(&self) -> Option<DropPayload> {
        if self.mime_type != TEXT_PLAIN {
            warn!("Ignoring drop with mime type {}", self.mime_type);
            return None;
        }
        match DropPayload::decode(&self.text) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Ignoring malformed drop payload: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Host -> Core Commands
// ============================================================================

fn default_mime_type() -> String {
    TEXT_PLAIN.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    /// Inventory item dropped onto the surface
    #[serde(rename = "drop", rename_all = "camelCase")]
    Drop {
        #[serde(default = "default_mime_type")]
        mime_type: String,
        payload: String,
        x: f32,
        y: f32,
    },

    /// Place a catalog item without merge checking
    #[serde(rename = "place", rename_all = "camelCase")]
    Place { item_id: String, x: f32, y: f32 },

    #[serde(rename = "beginMove")]
    BeginMove { token: TokenHandle },

    #[serde(rename = "move")]
    Move { token: TokenHandle, x: f32, y: f32 },

    #[serde(rename = "endMove")]
    EndMove { token: TokenHandle },

    #[serde(rename = "clear")]
    Clear,

    #[serde(rename = "resize")]
    Resize { width: f32, height: f32 },

    #[serde(rename = "snapshot")]
    Snapshot,

    #[serde(rename = "inventory")]
    Inventory,
}

// ============================================================================
// Core -> Host Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "placed")]
    Placed { token: TokenHandle },

    #[serde(rename = "moved")]
    Moved { token: TokenHandle, position: Point },

    #[serde(rename = "snapshot")]
    Snapshot(SurfaceSnapshot),

    #[serde(rename = "merge")]
    Merge(MergeEvent),

    #[serde(rename = "inventory")]
    Inventory {
        unlocked: Vec<Item>,
        discovered: usize,
        total: usize,
    },

    #[serde(rename = "error")]
    Error { message: String },
}
