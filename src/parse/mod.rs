pub mod detail;
pub mod listing;
pub mod table;

pub use detail::{parse_amounts, parse_detail, EMPTY_TIER_PAYOUT};
pub use listing::{parse_listing, select_recent};
pub use table::table_grid;
