use thiserror::Error;

use crate::catalog::SocketType;

/// Structural and typing failures raised while editing, importing or
/// planning a workflow document. None of these abort the process; the
/// current graph is left unchanged when one is returned.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{node}' has no {side} socket '{socket}'")]
    UnknownSocket {
        node: String,
        side: &'static str,
        socket: String,
    },

    #[error("unknown edge '{0}'")]
    UnknownEdge(String),

    #[error("edge '{edge}' references missing node '{node}'")]
    DanglingEdge { edge: String, node: String },

    #[error("incompatible socket types: {output} -> {input}")]
    IncompatibleSockets {
        output: SocketType,
        input: SocketType,
    },

    #[error("input '{socket}' on node '{node}' is already connected")]
    InputAlreadyConnected { node: String, socket: String },

    #[error("connecting '{from}' -> '{to}' would create a cycle")]
    CyclicConnection { from: String, to: String },

    #[error("workflow graph contains a cycle")]
    CycleDetected,

    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),

    #[error("malformed workflow document: {0}")]
    MalformedDocument(String),
}
