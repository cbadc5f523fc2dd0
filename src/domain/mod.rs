//! Domain model shared across the pipeline
//!
//! Everything that travels over the queues lives here. Wire encoding is
//! canonical field-tagged JSON: struct field order is fixed and every map is
//! a `BTreeMap`, so serialize -> deserialize -> serialize is byte-identical.

pub mod result;
pub mod task;
pub mod verdict;

pub use result::{ResultStatus, TransactionDetails, WorkResult};
pub use task::{WorkContext, WorkItem, WorkKind, WorkPriority, WorkStatus};
pub use verdict::{Verdict, VerdictDecision};
