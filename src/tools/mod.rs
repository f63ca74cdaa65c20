//! Tool adapter: uniform invocable tools over native closures and remote
//! schemas.

pub mod adapter;
pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod result;
pub mod shape;
pub mod tool;

pub use adapter::{adapt, RemoteTool};
pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use result::{ToolResult, ToolValue};
pub use shape::{ArgSpec, ArgumentShape, ParamKind, SchemaDegradation};
pub use tool::{NativeTool, Tool, ToolExecutionContext, ToolOrigin};
