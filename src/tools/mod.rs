//! Tool registration model: the parameter descriptor/schema layer, the
//! zero-value accessor, the tagged result type, and the keyed registry plus
//! invocation pipeline that ties them together.

pub mod accessor;
pub mod registry;
pub mod schema;
pub mod value;

pub use accessor::ParamAccessor;
pub use registry::{Tool, ToolBuilder, ToolEntry, ToolRegistry, ToolStats};
pub use schema::{check_structural, synthesize_schema, ParamDesc, PrimitiveType};
pub use value::ToolValue;
