/// Data layer: core types, loading, filtering, and the reductions behind
/// every chart.
///
/// Architecture:
/// ```text
///  transactions .csv
///        │
///        ▼
///   ┌──────────┐     ┌────────┐
///   │  loader   │◄────│ cache  │  keyed by path + mtime
///   └──────────┘     └────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Transaction>, label index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range + label predicates → filtered Dataset
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐  ┌──────────┐
///   │ aggregate │  │ outliers  │  z-score flags
///   └──────────┘  └──────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod outliers;
