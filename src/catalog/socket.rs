use serde::{Serialize, Deserialize};

/// Data type carried by a node socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    Text,
    Image,
    Settings,
    Number,
    /// Wildcard, connects to everything.
    Any,
}

impl SocketType {
    /// A connection is allowed iff either side is the wildcard or the tags match.
    pub fn is_compatible(self, target: SocketType) -> bool {
        self == SocketType::Any || target == SocketType::Any || self == target
    }
}

impl std::fmt::Display for SocketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            SocketType::Text => "text",
            SocketType::Image => "image",
            SocketType::Settings => "settings",
            SocketType::Number => "number",
            SocketType::Any => "any",
        };
        write!(f, "{}", tag)
    }
}
