//! The scanner
//!
//! A [Scanner] is the lexical state of one document: the concrete syntax, the
//!     compiled recognizers, the stack of open input sources and the active mode.
//!
//! Tokens are read with [Scanner::get_token] or [Scanner::next_token].
//! When the top input source ends it is popped and scanning continues in the
//!     source below, so the client only sees end of entity for the document
//!     entity and for sources pushed with [Entry::surfaced].
//!
//! Each source records the mode that was active when it was pushed.
//! If the mode is still the one the source was entered in when it ends, the
//!     recorded mode is restored; a literal that opened an entity in `alite`
//!     mode continues in `alit` mode after the entity.

mod literal;
mod refs;

pub use refs::{EntityReference, RefContext, Reference};

use crate::chars::{self, Char};
use crate::entity::{Entity, EntityManager};
use crate::error::{
    self, CancelledError, Diagnostic, Diagnostics, EmptyDelimiterError, EntityCannotRewindError,
    EntityLevelError, GroupEntityEndError, LexicalAmbiguityError, NameLengthError,
    NonSgmlCharacterError, Pass2EeError, SimpleStructuralError, UnrecognizedCharacterError,
};
use crate::input::InputSource;
use crate::mode::{self, Mode, ModeBucket};
use crate::options::ScannerOptions;
use crate::origin::{Location, Origin};
use crate::recognizer::compile::{self, CompiledModes, NormalMap};
use crate::recognizer::{Recognizer, RecognizerCache};
use crate::syntax::{Features, Quantity, Set, Shortrefs, Syntax};
use crate::token::{Token, TokenKind};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How an input source is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The mode the source is scanned in.
    pub mode: Mode,
    /// Return end of entity to the client instead of popping the source.
    ///
    /// The client then pops it with [Scanner::pop_input_stack].
    pub surface_end: bool,
}

impl Entry {
    pub fn new(mode: Mode) -> Entry {
        Entry {
            mode,
            surface_end: false,
        }
    }

    pub fn surfaced(mode: Mode) -> Entry {
        Entry {
            mode,
            surface_end: true,
        }
    }
}

#[derive(Debug)]
struct Frame {
    source: InputSource,
    entry_mode: Mode,
    resume_mode: Mode,
    surface_end: bool,
}

#[derive(Clone, Copy, Debug)]
struct RewindPoint {
    // Offset in the original text of the document entity.
    offset: usize,
    mode: Mode,
}

/// The lexical state of one document.
pub struct Scanner {
    syntax: Rc<Syntax>,
    features: Features,
    options: ScannerOptions,
    recognizers: RecognizerCache,
    shortrefs: Option<Shortrefs>,
    normal_map: Option<NormalMap>,
    stack: Vec<Frame>,
    mode: Mode,
    document_mode: Mode,
    special_parse: Option<Mode>,
    // Input level at which each open group was opened.
    groups: Vec<usize>,
    diagnostics: Diagnostics,
    cancel: Option<Arc<AtomicBool>>,
    cancelled: bool,
    entities: Option<Rc<dyn EntityManager>>,
    rewind_point: Option<RewindPoint>,
    replay_until: Option<usize>,
}

impl Scanner {
    pub fn new(syntax: Syntax, features: Features, options: ScannerOptions) -> Scanner {
        Scanner {
            syntax: Rc::new(syntax),
            features,
            options,
            recognizers: RecognizerCache::new(),
            shortrefs: None,
            normal_map: None,
            stack: vec![],
            mode: Mode::Pro,
            document_mode: Mode::Pro,
            special_parse: None,
            groups: vec![],
            diagnostics: Diagnostics::new(),
            cancel: None,
            cancelled: false,
            entities: None,
            rewind_point: None,
            replay_until: None,
        }
    }

    /// Set the entity declarations and storage used to resolve references.
    pub fn with_entity_manager(mut self, entities: Rc<dyn EntityManager>) -> Scanner {
        self.entities = Some(entities);
        self
    }

    pub fn set_entity_manager(&mut self, entities: Rc<dyn EntityManager>) {
        self.entities = Some(entities);
    }

    /// Set a flag that cancels scanning when it becomes true.
    ///
    /// The flag is polled each time a token is requested.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    pub fn syntax(&self) -> &Rc<Syntax> {
        &self.syntax
    }

    /// Switch to another concrete syntax.
    ///
    /// Recognizers compiled for the old syntax are dropped; buckets must be
    ///     compiled again or are compiled mode by mode as they are used.
    pub fn set_syntax(&mut self, syntax: Syntax) {
        self.recognizers.retain_version(syntax.version());
        self.syntax = Rc::new(syntax);
        self.normal_map = None;
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn options(&self) -> &ScannerOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Compile the recognizers of a bucket of modes.
    ///
    /// `shortrefs` are the short reference delimiters of the DTD and are
    ///     kept for compiling instance modes later.
    pub fn compile_modes(&mut self, bucket: ModeBucket, shortrefs: Option<&Shortrefs>) {
        if let Some(shortrefs) = shortrefs {
            self.shortrefs = Some(shortrefs.clone());
        }
        let modes = bucket.modes(&self.syntax, &self.features);
        if modes.is_empty() {
            log::debug!("the {bucket:?} bucket has no modes to compile");
            return;
        }
        let compiled = compile::compile_modes(
            &modes,
            &self.syntax,
            &self.features,
            self.shortrefs.as_ref(),
            self.options.warn_data_delim,
        );
        self.record_compile_diagnostics(&compiled);
        let version = self.syntax.version();
        for recognizer in compiled.recognizers {
            self.recognizers.insert(version, recognizer);
        }
        if modes.contains(&Mode::Mconnet) {
            self.normal_map = Some(compile::compile_normal_map(
                &self.syntax,
                &self.features,
                self.shortrefs.as_ref(),
            ));
        }
    }

    fn record_compile_diagnostics(&mut self, compiled: &CompiledModes) {
        for &delim in &compiled.empty_delims {
            self.diagnostics.record(EmptyDelimiterError { delim }, None);
        }
        for &(mode, recognized, dropped) in &compiled.ambiguities {
            let error = LexicalAmbiguityError {
                mode,
                recognized: recognized.describe(&self.syntax),
                dropped: dropped.describe(&self.syntax),
            };
            self.diagnostics.record(error, None);
        }
    }

    fn recognizer(&mut self, mode: Mode) -> Option<Rc<Recognizer>> {
        let version = self.syntax.version();
        if let Some(recognizer) = self.recognizers.get(mode, version) {
            return Some(Rc::clone(recognizer));
        }
        log::debug!("compiling the {mode} mode on demand");
        let compiled = compile::compile_modes(
            &[mode],
            &self.syntax,
            &self.features,
            self.shortrefs.as_ref(),
            self.options.warn_data_delim,
        );
        self.record_compile_diagnostics(&compiled);
        compiled
            .recognizers
            .into_iter()
            .map(|recognizer| self.recognizers.insert(version, recognizer))
            .last()
    }

    /// Start scanning a document entity.
    pub fn push_document(&mut self, name: &str, text: &str) {
        let text: Rc<[Char]> = chars::to_chars(text).into();
        let source = InputSource::new(Origin::document(name, Rc::clone(&text)), text);
        self.push_document_source(source);
    }

    /// Start scanning a document entity from an input source, such as one
    ///     that cannot be rewound.
    pub fn push_document_source(&mut self, source: InputSource) {
        self.unwind();
        self.cancelled = false;
        self.document_mode = self.mode;
        log::trace!("scanning document {}", source.origin().display_name());
        self.stack.push(Frame {
            source,
            entry_mode: self.mode,
            resume_mode: self.mode,
            surface_end: false,
        });
    }

    /// Number of open input sources; 1 when only the document entity is open.
    pub fn input_level(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn entity_level_error(&self) -> Option<Box<Diagnostic>> {
        let limit = self.syntax.quantity(Quantity::Entlvl);
        if self.stack.len().saturating_sub(1) >= limit as usize {
            Some(Diagnostic::boxed(
                EntityLevelError { limit },
                Some(self.current_location()),
            ))
        } else {
            None
        }
    }

    /// Push an input source on top of the stack.
    ///
    /// Fails, leaving the stack unchanged, if `ENTLVL` entities are already open.
    pub fn push_input(&mut self, source: InputSource, entry: Entry) -> error::Result<()> {
        if self.stack.is_empty() {
            self.push_document_source(source);
            self.mode = entry.mode;
            return Ok(());
        }
        if let Some(err) = self.entity_level_error() {
            return Err(err);
        }
        log::trace!(
            "push {} at level {} in the {} mode",
            source.origin().display_name(),
            self.stack.len() + 1,
            entry.mode
        );
        self.stack.push(Frame {
            source,
            entry_mode: entry.mode,
            resume_mode: self.mode,
            surface_end: entry.surface_end,
        });
        self.mode = entry.mode;
        Ok(())
    }

    /// Pop the top input source.
    ///
    /// Returns false if the stack was empty.
    pub fn pop_input_stack(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        let level = self.stack.len() + 1;
        log::trace!(
            "pop {} from level {level}",
            frame.source.origin().display_name()
        );
        if self.mode == frame.entry_mode {
            self.mode = frame.resume_mode;
        }
        if self.groups.iter().any(|&l| l >= level) {
            let location = frame.source.location(frame.source.cursor());
            self.diagnostics.record(GroupEntityEndError, Some(location));
            for l in self.groups.iter_mut() {
                if *l >= level {
                    *l = level - 1;
                }
            }
        }
        true
    }

    /// Close every input source without reporting anything.
    fn unwind(&mut self) {
        if !self.stack.is_empty() {
            log::trace!("unwinding {} input sources", self.stack.len());
        }
        self.stack.clear();
        self.groups.clear();
        self.special_parse = None;
        self.replay_until = None;
    }

    /// Whether an entity is open on the input stack.
    pub fn entity_is_open(&self, entity: &Entity) -> bool {
        self.stack.iter().any(|frame| match frame.source.origin().entity() {
            Some(open) => open.name == entity.name && open.decl_type == entity.decl_type,
            None => false,
        })
    }

    fn poll_cancel(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        let requested = match &self.cancel {
            Some(flag) => flag.load(Ordering::Relaxed),
            None => false,
        };
        if !requested {
            return false;
        }
        let location = self.top().map(InputSource::token_location);
        self.unwind();
        self.cancelled = true;
        self.diagnostics.record(CancelledError, location);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Close every input source at the client's request, for example when
    ///     too many errors have been found.
    ///
    /// Afterwards every request for a token returns end of entity.
    pub fn give_up(&mut self) {
        log::debug!("giving up at input level {}", self.stack.len());
        self.unwind();
    }

    /// Whether the number of errors has reached [ScannerOptions::error_limit].
    pub fn should_give_up(&self) -> bool {
        match self.options.error_limit {
            Some(limit) => self.diagnostics.error_count() >= limit,
            None => false,
        }
    }

    fn top(&self) -> Option<&InputSource> {
        self.stack.last().map(|frame| &frame.source)
    }

    fn top_mut(&mut self) -> Option<&mut InputSource> {
        self.stack.last_mut().map(|frame| &mut frame.source)
    }

    /// Get the next token in `mode`, which becomes the active mode.
    pub fn get_token(&mut self, mode: Mode) -> Token {
        self.mode = mode;
        self.next_token()
    }

    /// Get the next token in the active mode.
    pub fn next_token(&mut self) -> Token {
        if self.poll_cancel() {
            return Token::end_of_entity(0);
        }
        let token = self.scan(1);
        self.check_replay(&token);
        token
    }

    /// Scan a token, popping sources above `floor` as they end.
    fn scan(&mut self, floor: usize) -> Token {
        loop {
            let recognizer = self.recognizer(self.mode);
            let Some(frame) = self.stack.last_mut() else {
                return Token::end_of_entity(0);
            };
            let source = &mut frame.source;
            let token = if source.at_data_substitution() {
                source.start_token();
                source.token_char();
                Token {
                    kind: TokenKind::Char,
                    start: source.token_start(),
                    length: 1,
                }
            } else {
                match recognizer {
                    Some(recognizer) => recognizer.recognize(source),
                    None => Token::end_of_entity(source.cursor()),
                }
            };
            if !token.is_ee() || frame.surface_end || self.stack.len() <= floor.max(1) {
                return token;
            }
            self.pop_input_stack();
        }
    }

    fn check_replay(&mut self, token: &Token) {
        let Some(offset) = self.replay_until else {
            return;
        };
        if self.stack.len() != 1 {
            return;
        }
        let Some(source) = self.top() else {
            return;
        };
        if source.original_offset(source.cursor()) >= offset {
            log::trace!("replay reached offset {offset}");
            self.replay_until = None;
        } else if token.is_ee() {
            let location = source.token_location();
            self.replay_until = None;
            self.diagnostics.record(Pass2EeError, Some(location));
        }
    }

    /// Push the current token back; the next token starts where it started.
    pub fn unget_token(&mut self) {
        if let Some(source) = self.top_mut() {
            source.unget_token();
        }
    }

    /// Location of the start of the current token.
    ///
    /// Null if no input is open.
    pub fn current_location(&self) -> Location {
        self.top()
            .map(InputSource::token_location)
            .unwrap_or_default()
    }

    /// The first character of the current token.
    pub fn current_char(&self) -> Option<Char> {
        self.top()?.token_text().first().copied()
    }

    pub fn current_token_start(&self) -> usize {
        self.top().map(InputSource::token_start).unwrap_or(0)
    }

    pub fn current_token_length(&self) -> usize {
        self.top().map(InputSource::token_length).unwrap_or(0)
    }

    pub fn current_token_text(&self) -> &[Char] {
        match self.top() {
            Some(source) => source.token_text(),
            None => &[],
        }
    }

    pub fn current_token_string(&self) -> String {
        chars::to_string(self.current_token_text())
    }

    /// Extend the current token over name characters and return it.
    ///
    /// Names longer than `NAMELEN` are reported but returned whole.
    pub fn extend_name(&mut self) -> Vec<Char> {
        let limit = self.syntax.quantity(Quantity::Namelen);
        let syntax = &self.syntax;
        let Some(frame) = self.stack.last_mut() else {
            return vec![];
        };
        frame.source.extend_token_while(|c| syntax.is_name_char(c));
        let name = frame.source.token_text().to_vec();
        if name.len() > limit as usize {
            let location = frame.source.token_location();
            self.diagnostics.record(
                NameLengthError {
                    limit,
                    name: chars::to_string(&name),
                },
                Some(location),
            );
        }
        name
    }

    /// Extend the current token over characters that are always data in
    ///     mixed content, returning the number of characters added.
    ///
    /// Characters substituted for references are not added.
    pub fn extend_data(&mut self) -> usize {
        if self.normal_map.is_none() {
            self.normal_map = Some(compile::compile_normal_map(
                &self.syntax,
                &self.features,
                self.shortrefs.as_ref(),
            ));
        }
        let (Some(map), Some(frame)) = (&self.normal_map, self.stack.last_mut()) else {
            return 0;
        };
        let source = &mut frame.source;
        let mut n = 0;
        while let Some(c) = source.peek_char() {
            if source.at_substitution() || !map.contains(c) {
                break;
            }
            source.token_char();
            n += 1;
        }
        n
    }

    /// Report the current token as a character the active mode does not recognize.
    pub fn report_unrecognized(&mut self) {
        let Some(c) = self.current_char() else {
            return;
        };
        let location = Some(self.current_location());
        if !self.syntax.set(Set::SgmlChar).contains(c) {
            self.diagnostics
                .record(NonSgmlCharacterError { character: c }, location);
            return;
        }
        let error = UnrecognizedCharacterError {
            character: c,
            mode: self.mode,
            expected: mode::expected_tokens(self.mode, &self.syntax, &self.features),
        };
        self.diagnostics.record(error, location);
    }

    /// Start scanning CDATA or RCDATA element content in `mode`.
    ///
    /// Entities referenced while it lasts are entered in the mode's entity
    ///     variant, `rccone` for replaceable character data.
    pub fn special_parse(&mut self, mode: Mode) {
        self.special_parse = Some(mode);
        self.mode = mode;
    }

    pub fn end_special_parse(&mut self, mode: Mode) {
        self.special_parse = None;
        self.mode = mode;
    }

    pub fn special_parse_mode(&self) -> Option<Mode> {
        self.special_parse
    }

    /// The mode an entity referenced now is entered in.
    pub(crate) fn entity_mode(&self) -> Mode {
        self.special_parse.unwrap_or(self.mode).in_entity()
    }

    /// Record that a group was opened at the current input level.
    pub fn open_group(&mut self) {
        self.groups.push(self.stack.len());
    }

    /// Record that the innermost open group was closed.
    ///
    /// Returns false, after reporting it, if the group was opened in another entity.
    pub fn close_group(&mut self) -> bool {
        match self.groups.pop() {
            Some(level) if level == self.stack.len() => true,
            Some(_) => {
                let location = Some(self.current_location());
                self.diagnostics.record(GroupEntityEndError, location);
                false
            }
            None => false,
        }
    }

    pub fn group_level(&self) -> usize {
        self.groups.len()
    }

    /// Remember the current position in the document entity so that it can
    ///     be scanned again after [Scanner::rewind].
    ///
    /// Fails if the document entity cannot be read a second time.
    pub fn save_rewind_point(&mut self) -> error::Result<()> {
        let Some(frame) = self.stack.first() else {
            return Err(Diagnostic::boxed(
                SimpleStructuralError::new("there is no document to rewind"),
                None,
            ));
        };
        let source = &frame.source;
        if !source.is_rewindable() {
            return Err(Diagnostic::boxed(
                EntityCannotRewindError {
                    name: source.origin().display_name(),
                },
                Some(source.token_location()),
            ));
        }
        self.rewind_point = Some(RewindPoint {
            offset: source.original_offset(source.cursor()),
            mode: self.document_mode,
        });
        Ok(())
    }

    /// Go back to the start of the document entity.
    ///
    /// Every other input source is closed and substitutions made by
    ///     character references are discarded.
    /// Until the saved rewind point is reached again, an end of the document
    ///     entity is reported.
    pub fn rewind(&mut self) -> error::Result<()> {
        let Some(point) = self.rewind_point else {
            return Err(Diagnostic::boxed(
                SimpleStructuralError::new("no rewind point has been saved"),
                None,
            ));
        };
        self.stack.truncate(1);
        let Some(frame) = self.stack.first_mut() else {
            return Err(Diagnostic::boxed(
                SimpleStructuralError::new("there is no document to rewind"),
                None,
            ));
        };
        if !frame.source.rewind() {
            return Err(Diagnostic::boxed(
                EntityCannotRewindError {
                    name: frame.source.origin().display_name(),
                },
                None,
            ));
        }
        log::trace!("rewound to replay {} characters", point.offset);
        self.mode = point.mode;
        self.groups.clear();
        self.special_parse = None;
        self.replay_until = Some(point.offset);
        Ok(())
    }

    /// Give up the ability to rewind.
    pub fn will_not_rewind(&mut self) {
        self.rewind_point = None;
        if let Some(frame) = self.stack.first_mut() {
            frame.source.will_not_rewind();
        }
    }
}
