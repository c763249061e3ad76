//! Domain primitives shared by every strategy component.

pub mod ids;
pub mod period;
pub mod series;

pub use ids::{ConditionId, DatasetId};
pub use period::{Period, ZeroPeriod};
pub use series::{Comparison, Direction, MaKind, Series};
