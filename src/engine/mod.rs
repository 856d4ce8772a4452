//! Pure reconciliation and pricing, plus turning the result into paced
//! store writes.

pub mod cells;
pub mod plan;
pub mod pricing;
pub mod reconcile;
pub mod writer;

pub use plan::{build_plan, group_runs, PlanOptions, RangeWrite, WritePlan, WRITE_GROUP_DELAY};
pub use pricing::{compute_new_price, price_moved, PriceOutcome, PRICE_CHANGE_TOLERANCE};
pub use reconcile::{reconcile, Reconciliation, RemovedListing};
pub use writer::{execute_plan, write_header, PlanReport};
