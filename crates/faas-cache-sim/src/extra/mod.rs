pub mod csv_trace;
pub mod synthetic_trace;
