//! PATCH support: request messages, paths and the patch engine.

pub mod engine;
pub mod operation;

pub use engine::{PatchEngine, apply};
pub use operation::{PATCH_OP_SCHEMA, PatchOp, PatchOperation, PatchRequest, PathExpression};
