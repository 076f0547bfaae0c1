use rand::prelude::Distribution;
use rand::Rng;
use sgmlcore::prelude::*;
use std::rc::Rc;

/// Build a scanner over `input` in mixed content, with both mode batches compiled.
pub fn new_scanner(input: &str, entities: EntityTable) -> Scanner {
    let syntax = Syntax::reference(&IdentityCharset);
    let mut scanner = Scanner::new(syntax, Features::default(), ScannerOptions::default())
        .with_entity_manager(Rc::new(entities));
    scanner.compile_modes(ModeBucket::Prolog, None);
    scanner.compile_modes(ModeBucket::Instance, None);
    scanner.set_mode(Mode::Mcon);
    scanner.push_document("bench", input);
    scanner
}

/// Scan the input in mixed content without resolving references and return the number of tokens.
pub fn run_recognizer(input: &str) -> usize {
    let mut scanner = new_scanner(input, EntityTable::new());
    let mut n = 0_usize;
    loop {
        let token = scanner.next_token();
        match token.kind {
            TokenKind::Ee => return n,
            TokenKind::Char => {
                scanner.extend_data();
            }
            _ => {}
        }
        n += 1;
    }
}

/// Scan the input in mixed content, resolving every reference, and return the number of data characters.
pub fn run_expansion(input: &str, entities: EntityTable) -> usize {
    let mut scanner = new_scanner(input, entities);
    let mut n = 0_usize;
    loop {
        let token = scanner.next_token();
        let result = match token.kind {
            TokenKind::Ee => return n,
            TokenKind::CroDigit | TokenKind::HcroHexDigit => scanner
                .parse_numeric_char_ref(token.kind == TokenKind::HcroHexDigit)
                .map(|_| ()),
            TokenKind::CroNameStart => scanner.parse_named_char_ref().map(|_| ()),
            TokenKind::EroNameStart => scanner
                .parse_entity_reference(false)
                .and_then(|reference| scanner.reference_entity(&reference, RefContext::Content))
                .map(|_| ()),
            _ => {
                n += scanner.current_token_length();
                Ok(())
            }
        };
        if let Err(err) = result {
            panic!["benchmark input produced an error: {}", err.title()];
        }
    }
}

/// Entities `e0` through `e{depth-1}`, where each one references the next and the last holds `text`.
pub fn nested_entities(depth: usize, text: &str) -> EntityTable {
    let mut table = EntityTable::new();
    for i in 0..depth {
        let replacement = if i + 1 == depth {
            text.to_string()
        } else {
            format!["<&e{};>", i + 1]
        };
        table.declare(Entity::internal_text(
            &format!["e{i}"],
            DeclType::GeneralEntity,
            &replacement,
        ));
    }
    table
}

pub struct Weights {
    pub letter: u32,
    pub space: u32,
    pub record_end: u32,
    pub start_tag: u32,
    pub end_tag: u32,
    pub char_ref: u32,
    pub comment: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            letter: 300,
            space: 50,
            record_end: 10,
            start_tag: 10,
            end_tag: 10,
            char_ref: 5,
            comment: 1,
        }
    }
}

static RANDOM_GIS: [&str; 8] = ["p", "q", "em", "list", "item", "sec", "title", "note"];

/// Generate a random document instance of roughly `length` characters.
///
/// Every character reference in the output is valid and every comment is closed,
///     so the document scans without errors.
pub fn generate_random_sgml_document(
    rng: &mut rand::prelude::StdRng,
    length: usize,
    weights: &Weights,
) -> String {
    let dist = match rand::distributions::WeightedIndex::new([
        weights.letter,
        weights.space,
        weights.record_end,
        weights.start_tag,
        weights.end_tag,
        weights.char_ref,
        weights.comment,
    ]) {
        Ok(dist) => dist,
        Err(err) => panic!["invalid weights: {err}"],
    };
    let mut result = String::with_capacity(length + 100);
    while result.len() < length {
        match dist.sample(rng) {
            0 => {
                let offset = match rng.gen_range(0..4) {
                    0 => b'A',
                    _ => b'a',
                };
                result.push((offset + rng.gen_range(0..26)) as char);
            }
            1 => result.push(' '),
            2 => result.push('\n'),
            3 => {
                result.push('<');
                result.push_str(RANDOM_GIS[rng.gen_range(0..RANDOM_GIS.len())]);
                result.push('>');
            }
            4 => {
                result.push_str("</");
                result.push_str(RANDOM_GIS[rng.gen_range(0..RANDOM_GIS.len())]);
                result.push('>');
            }
            5 => match rng.gen_range(0..3) {
                0 => result.push_str(&format!["&#{};", rng.gen_range(65..91)]),
                1 => result.push_str(&format!["&#x{:x};", rng.gen_range(97..123)]),
                _ => result.push_str("&#RS;"),
            },
            _ => result.push_str("<!-- a comment -->"),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_document_expands_without_errors() {
        let mut rng = rand::prelude::StdRng::seed_from_u64(43);
        let input = generate_random_sgml_document(&mut rng, 5000, &Default::default());
        assert!(input.len() >= 5000);
        assert!(run_recognizer(&input) > 0);
        run_expansion(&input, EntityTable::new());
    }

    #[test]
    fn nested_entities_expand() {
        assert_eq!(run_expansion("&e0;", nested_entities(3, "xyz")), 7);
    }
}
