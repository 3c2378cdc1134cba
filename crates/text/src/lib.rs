//! # Plan Bot Text
//!
//! Everything that turns a raw message into something a matcher can score.
//!
//! ```text
//! raw message
//!     │
//!     ├──> TriggerExtractor  (span after the last summon keyword)
//!     │
//!     ├──> extract_flags     (remaining text + Options)
//!     │
//!     └──> Preprocessor      (fold → lowercase → strip → stopwords → stem [→ bigrams])
//! ```

mod error;
mod normalizer;
mod preprocess;
mod stopwords;

pub use error::{Result, TextError};
pub use normalizer::{extract_flags, extract_trigger_span, TriggerExtractor};
pub use preprocess::{bigrams, Filter, Preprocessor, MIN_TOKEN_LEN};
pub use stopwords::{is_generic_stopword, DEFAULT_DOMAIN_STOPWORDS};
