use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serializable projection of coordinator state.
///
/// Missing fields deserialize as empty so hand-written files only need the
/// sections they use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub producers: Vec<String>,
    #[serde(default)]
    pub observers: Vec<String>,
    /// Observer id to subscribed topic ids. Observers appear in creation
    /// order, topics in subscription order.
    #[serde(default)]
    pub subscriptions: IndexMap<String, Vec<String>>,
}
