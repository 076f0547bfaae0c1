//! # Sgmlcore: the lexical and entity core of an SGML parser.
//!
//! SGML lets each document declare its own delimiters, character classes and
//!     short references, so the scanners cannot be written by hand.
//! This crate compiles them at run time from a [syntax::Syntax]:
//!     the characters used by a batch of lexical [mode::Mode]s are split into
//!     equivalence classes by a [partition::Partition], and each mode gets a
//!     [recognizer::Recognizer] built over those classes.
//!
//! Scanning happens through a [scanner::Scanner], which owns a stack of
//!     [input::InputSource]s, one per open entity.
//! Every character keeps its provenance through the [origin::Origin] chain,
//!     so a location deep inside nested entity expansions can always be traced
//!     back to the reference that produced it.
//!
//! ```
//! use sgmlcore::prelude::*;
//!
//! let syntax = Syntax::reference(&IdentityCharset);
//! let mut scanner = Scanner::new(syntax, Features::default(), ScannerOptions::default());
//! scanner.compile_modes(ModeBucket::Prolog, None);
//! scanner.compile_modes(ModeBucket::Instance, None);
//! scanner.push_document("doc", "<!-- x -->");
//! let token = scanner.get_token(Mode::Mcon);
//! assert_eq!(token.kind, TokenKind::MdoCom);
//! assert_eq!(scanner.current_token_string(), "<!--");
//! ```

pub mod chars;
pub mod entity;
pub mod error;
pub mod input;
pub mod mode;
pub mod options;
pub mod origin;
pub mod partition;
pub mod prelude;
pub mod recognizer;
pub mod scanner;
pub mod syntax;
pub mod token;
