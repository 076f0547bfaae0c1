/*!
Sgmlcore unit testing library

This is a crate for writing unit tests for code that uses Sgmlcore.
Each test builds a fresh [Scanner] over a short input, configured by a list of
    [TestOption]s, and checks what the scanner makes of the input.

## Test types

### Token tests

Run using [`run_token_test`].

These tests verify the exact tokens a mode splits an input into,
    together with the text of each token.

### Expansion equality tests

Run using [`run_expansion_equality_test`].

These tests verify that two inputs expand to the same text.
Expanding means scanning the input in one mode and resolving every character
    and entity reference on the way, so that
```text
<!ENTITY e "Hola Mundo">
&e; - &e;
```
and
```text
Hola Mundo - Hola Mundo
```
expand the same.
The right hand side is usually a constant.
The left hand side must expand without errors.

### Diagnostic tests

Run using [`run_diagnostic_test`].

These tests verify the titles of the diagnostics produced while expanding an input.

## The test suite macro

The preferred way to write a suite of unit tests is the [`test_suite`] macro.
*/

use std::rc::Rc;

pub use sgmlcore;
use sgmlcore::prelude::*;

/// Option passed to a test runner.
pub enum TestOption {
    /// Change the reference concrete syntax before the scanner is built.
    Syntax(fn(&mut Syntax)),
    Features(Features),
    Options(ScannerOptions),
    /// Declare entities and add entity storage.
    Entities(fn(&mut EntityTable)),
    /// Short reference delimiters of the DTD, in order.
    Shortrefs(&'static [&'static str]),
    /// The mode to scan the input in. Defaults to mixed content.
    Mode(Mode),
}

struct Setup {
    syntax: Syntax,
    features: Features,
    options: ScannerOptions,
    entities: EntityTable,
    shortrefs: Option<Shortrefs>,
    mode: Mode,
}

impl Setup {
    fn new(options: &[TestOption]) -> Setup {
        let mut setup = Setup {
            syntax: Syntax::reference(&IdentityCharset),
            features: Default::default(),
            options: Default::default(),
            entities: EntityTable::new(),
            shortrefs: None,
            mode: Mode::Mcon,
        };
        for option in options {
            match option {
                TestOption::Syntax(f) => f(&mut setup.syntax),
                TestOption::Features(features) => setup.features = *features,
                TestOption::Options(options) => setup.options = options.clone(),
                TestOption::Entities(f) => f(&mut setup.entities),
                TestOption::Shortrefs(delims) => setup.shortrefs = Some(Shortrefs::from_strs(delims)),
                TestOption::Mode(mode) => setup.mode = *mode,
            }
        }
        setup
    }

    fn build(self, input: &str) -> Scanner {
        let mut scanner = Scanner::new(self.syntax, self.features, self.options)
            .with_entity_manager(Rc::new(self.entities));
        scanner.compile_modes(ModeBucket::Prolog, None);
        scanner.compile_modes(ModeBucket::Instance, self.shortrefs.as_ref());
        scanner.set_mode(self.mode);
        scanner.push_document("input", input);
        scanner
    }
}

/// Build a scanner over `input` with the given options.
pub fn new_scanner(input: &str, options: &[TestOption]) -> Scanner {
    Setup::new(options).build(input)
}

/// Scan tokens in the active mode until the end of the document entity.
pub fn tokenize(scanner: &mut Scanner) -> Vec<(TokenKind, String)> {
    let mut tokens = vec![];
    loop {
        let token = scanner.next_token();
        if token.is_ee() {
            return tokens;
        }
        tokens.push((token.kind, scanner.current_token_string()));
    }
}

/// Scan the input in the active mode, resolving references, and return the text.
///
/// Reference errors are recorded in the scanner's diagnostics.
pub fn expand(scanner: &mut Scanner) -> String {
    let mut output = String::new();
    loop {
        if scanner.should_give_up() {
            scanner.give_up();
        }
        let token = scanner.next_token();
        let result = match token.kind {
            TokenKind::Ee => return output,
            TokenKind::CroDigit | TokenKind::HcroHexDigit => scanner
                .parse_numeric_char_ref(token.kind == TokenKind::HcroHexDigit)
                .map(|_| ()),
            TokenKind::CroNameStart => scanner.parse_named_char_ref().map(|_| ()),
            TokenKind::EroNameStart => scanner
                .parse_entity_reference(false)
                .and_then(|reference| scanner.reference_entity(&reference, RefContext::Content))
                .map(|reference| match reference {
                    Reference::Cdata(origin) | Reference::Sdata(origin) => {
                        if let Some(text) = origin.text() {
                            output.push_str(&sgmlcore::chars::to_string(text));
                        }
                    }
                    _ => {}
                }),
            TokenKind::Unrecognized => {
                scanner.report_unrecognized();
                Ok(())
            }
            _ => {
                output.push_str(&scanner.current_token_string());
                Ok(())
            }
        };
        if let Err(err) = result {
            scanner.diagnostics_mut().push(*err);
        }
    }
}

/// Run a token test.
///
/// The test passes if the input scans to exactly the expected tokens.
pub fn run_token_test(input: &str, want: &[(TokenKind, &str)], options: &[TestOption]) {
    let mut scanner = new_scanner(input, options);
    let got = tokenize(&mut scanner);
    let want: Vec<(TokenKind, String)> = want
        .iter()
        .map(|(kind, text)| (*kind, text.to_string()))
        .collect();
    assert_eq!(got, want, "tokens of input {input:?}");
}

/// Run an expansion equality test.
///
/// The test passes if the two inputs expand to the same text and the left
///     hand side expands without errors.
pub fn run_expansion_equality_test(lhs: &str, rhs: &str, options: &[TestOption]) {
    let mut scanner = new_scanner(lhs, options);
    let output_1 = expand(&mut scanner);
    if scanner.diagnostics().error_count() > 0 {
        for diagnostic in scanner.diagnostics().iter() {
            println!("{diagnostic}");
        }
        panic!("expansion of the left hand side produced errors");
    }
    let output_2 = expand(&mut new_scanner(rhs, options));
    if output_1 != output_2 {
        println!("Expansion output is different:");
        println!("------[lhs]------");
        println!("{output_1:?}");
        println!("------[rhs]------");
        println!("{output_2:?}");
        println!("-----------------");
        panic!("expansion equality test failed");
    }
}

/// Run a diagnostic test.
///
/// The test passes if expanding the input produces diagnostics with exactly
///     the given titles, in order.
pub fn run_diagnostic_test(input: &str, want: &[&str], options: &[TestOption]) {
    let mut scanner = new_scanner(input, options);
    expand(&mut scanner);
    let got = scanner.diagnostics().titles();
    if got != want {
        for diagnostic in scanner.diagnostics().iter() {
            println!("{diagnostic}");
        }
    }
    assert_eq!(got, want, "diagnostics of input {input:?}");
}

/// Macro to generate a suite of unit tests
///
/// The arguments to the macro are:
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runners.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case the defaults are used.
///
/// - `token_tests(cases...)`: a list of token test cases.
///     Each case is of the form (case name, input, expected tokens).
///     The data here is fed into the [run_token_test] test runner.
///
/// - `expansion_equality_tests(cases...)`: a list of expansion equality test cases.
///     Each case is of the form (case name, left hand side, right hand side).
///     The data here is fed into the [run_expansion_equality_test] test runner.
///
/// - `diagnostic_tests(cases...)`: a list of diagnostic test cases.
///     Each case is of the form (case name, input, expected titles).
///     The data here is fed into the [run_diagnostic_test] test runner.
///
/// Only one `options()` argument may be provided, and if provided it must be in the first position.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( options $options: tt, token_tests ( $( ($name: ident, $input: expr, $want: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let options: Vec<sgmlcore_testing::TestOption> = vec! $options;
                sgmlcore_testing::run_token_test($input, &$want, &options);
            }
        )*
    );
    ( options $options: tt, expansion_equality_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let options: Vec<sgmlcore_testing::TestOption> = vec! $options;
                sgmlcore_testing::run_expansion_equality_test($lhs, $rhs, &options);
            }
        )*
    );
    ( options $options: tt, diagnostic_tests ( $( ($name: ident, $input: expr, $want: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let options: Vec<sgmlcore_testing::TestOption> = vec! $options;
                sgmlcore_testing::run_diagnostic_test($input, &$want, &options);
            }
        )*
    );
    ( options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `options`, `token_tests`, `expansion_equality_tests`, `diagnostic_tests`");
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            sgmlcore_testing::test_suite![options $options, $test_kind $test_cases,];
        )+
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        sgmlcore_testing::test_suite![options (), $( $test_kind $test_cases, )+ ];
    );
}
