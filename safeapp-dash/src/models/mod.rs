//! Domain models decoded from canonical webhook rows

mod calendar;
mod field_record;
mod lenient;
mod stock_row;
mod task;

pub use calendar::{CalendarEvent, EventStart};
pub use field_record::FieldRecord;
pub use stock_row::{decode_stock_rows, RowId, StockRow};
pub use task::{sort_pending_first, Task, TaskStatus};
