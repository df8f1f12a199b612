//! Query intake: request-list parsing and query classification.
//!
//! Operators keep a line-delimited list of wanted books. Each non-comment
//! line becomes a [`QueryKey`], which is either an ISBN (searched with an
//! exact match) or free text (searched by title).

mod isbn;
mod query;

pub use isbn::{is_isbn, normalize_isbn};
pub use query::{COMMENT_MARKER, MIN_QUERY_LENGTH, QueryKey, QueryKind, parse_request_lines};
