//! Output generation for article documents and the top-level index.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders one [`crate::models::Article`] to a Markdown document
//! - [`indexes`]: Rebuilds `README.md` from the output tree
//!
//! # Output Structure
//!
//! ```text
//! root/
//! ├── README.md              # Index, rebuilt every run
//! ├── generator/
//! │   └── state.json         # Day counter and used slugs
//! └── daily/
//!     ├── day_001/
//!     │   ├── binary_search.md
//!     │   └── kmp_algorithm.md
//!     └── day_002/
//!         └── segment_tree.md
//! ```

pub mod indexes;
pub mod markdown;
