mod analytics_handler;

pub use analytics_handler::{__path_get_breakdown, __path_get_summary, get_breakdown, get_summary};
