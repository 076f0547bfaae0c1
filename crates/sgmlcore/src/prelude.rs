//! Module that re-exports the types most users of the crate need.
//!
//! ```
//! use sgmlcore::prelude::*;
//! ```

pub use crate::chars::{Char, CharsetInfo, IdentityCharset};
pub use crate::entity::{DeclType, Entity, EntityKind, EntityManager, EntityTable, ExternalId, OpenedEntity};
pub use crate::error::{Diagnostic, Diagnostics, SgmlError};
pub use crate::input::InputSource;
pub use crate::mode::{Mode, ModeBucket};
pub use crate::options::ScannerOptions;
pub use crate::origin::{Location, Origin};
pub use crate::scanner::{Entry, EntityReference, RefContext, Reference, Scanner};
pub use crate::syntax::{DelimGeneral, Features, Quantity, Set, Shortrefs, Syntax};
pub use crate::token::{Token, TokenKind};
