//! # REST API Module
//!
//! PostgREST-style record endpoints: query-string translation, the
//! generic record controller, and the table accessors behind it.

pub mod accessor;
pub mod controller;
pub mod errors;
pub mod filter;
pub mod memory;
pub mod parser;
pub mod server;

pub use accessor::{AccessError, AccessResult, RecordId, TableAccessor, TableRegistry};
pub use controller::RecordController;
pub use errors::{RestError, RestResult};
pub use filter::{FilterExpr, FilterOperator, FilterSet};
pub use memory::MemoryTable;
pub use parser::{ClauseError, Direction, OrderBy, ParseMode, QuerySpec, Selection};
pub use server::RestServer;
