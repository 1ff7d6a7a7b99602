pub mod join;
pub mod normalize;
pub mod ordering;
pub mod palette;
pub mod primitives;
pub mod schema;
pub mod types;

pub use join::{JoinPolicy, JoinReport, join, join_with_policy};
pub use normalize::{
    RawRow, TotalFieldSet, normalize_proportions, normalize_totals, rows_from_json_str,
};
pub use ordering::{
    OrderingStrategy, PinPolicy, PinPosition, SortDirection, order_by_all_time_max,
    order_by_current_max, order_by_range, order_variants, shuffle,
};
pub use palette::{
    ColorAssignment, ColorPool, DEFAULT_POOL_SIZE, HexColor, assign, regenerate,
};
pub use primitives::parse_date;
pub use schema::{MissingFieldPolicy, extract_schema};
pub use types::{ProportionSample, ScaledSample, TotalSample, VariantId, VariantOrder, VariantSchema};
