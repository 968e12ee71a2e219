//! Layer ids.
//!
//! Every layer carries a string id that the host keeps in its own state
//! (selection, drag targets, gallery links). Ids are interned so the editor
//! can copy and compare them freely; the string only matters at the JSON
//! boundary.

use crate::model::ElementType;
use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static LAYER_IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Numbering for generated ids, shared by both layer types.
static NEXT_LAYER: AtomicU64 = AtomicU64::new(1);

/// Id of one layer in a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    pub fn intern(s: &str) -> Self {
        ElementId(LAYER_IDS.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        LAYER_IDS.resolve(&self.0)
    }

    /// New id for a layer of `kind`, such as `image_4` or `text_5`.
    ///
    /// Ids that arrived with a loaded document are never handed out again.
    pub fn fresh(kind: ElementType) -> Self {
        loop {
            let n = NEXT_LAYER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}_{n}", kind.as_str());
            if LAYER_IDS.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer:{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(de::Error::custom("layer id must not be empty"));
        }
        Ok(ElementId::intern(trimmed))
    }
}
