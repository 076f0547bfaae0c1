use sgmlcore::prelude::*;
use sgmlcore_testing::*;

fn entities(table: &mut EntityTable) {
    table.declare(Entity::internal_text("e", DeclType::GeneralEntity, "Hola Mundo"));
    table.declare(Entity::internal_text("nested", DeclType::GeneralEntity, "[&e;]"));
    table.declare(Entity::internal_text("loop", DeclType::GeneralEntity, "<&loop;>"));
    table.declare(Entity::internal_text("a", DeclType::GeneralEntity, "&b;"));
    table.declare(Entity::internal_text("b", DeclType::GeneralEntity, "&c;"));
    table.declare(Entity::internal_text("c", DeclType::GeneralEntity, "x"));
    table.declare(Entity::predefined("lt", '<' as Char));
    table.declare(Entity::internal_cdata("cdata", "<raw>"));
    table.declare(Entity::external_text(
        "chapter",
        DeclType::GeneralEntity,
        ExternalId::system("chapter.sgm"),
    ));
    table.add_storage("chapter.sgm", "Chapter &e;", true);
}

test_suite![
    options(TestOption::Entities(entities)),
    token_tests(
        (
            comment_declaration_open,
            "<!--",
            [(TokenKind::MdoCom, "<!--")]
        ),
        (
            start_tag_open,
            "<p>",
            [
                (TokenKind::StagoNameStart, "<"),
                (TokenKind::Char, "p"),
                (TokenKind::Char, ">"),
            ]
        ),
        (
            end_tag_open,
            "</p",
            [(TokenKind::EtagoNameStart, "</"), (TokenKind::Char, "p")]
        ),
        (
            record_boundaries,
            "a\r\n",
            [
                (TokenKind::Char, "a"),
                (TokenKind::Re, "\r"),
                (TokenKind::Rs, "\n"),
            ]
        ),
        (
            references_are_not_resolved_by_the_recognizer,
            "&e;&#1",
            [
                (TokenKind::EroNameStart, "&"),
                (TokenKind::Char, "e"),
                (TokenKind::Char, ";"),
                (TokenKind::CroDigit, "&#"),
                (TokenKind::Char, "1"),
            ]
        ),
        (
            marked_section_start,
            "<![",
            [(TokenKind::MdoDso, "<![")]
        ),
    ),
    expansion_equality_tests(
        (internal_entity, "&e; - &e;", "Hola Mundo - Hola Mundo"),
        (nested_entity, "&nested;", "[Hola Mundo]"),
        (external_entity, "&chapter;.", "Chapter Hola Mundo."),
        (numeric_char_ref, "&#72;ola", "Hola"),
        (hex_char_ref, "&#x48;ola", "Hola"),
        (char_ref_as_data, "&#60;p>", "<p>"),
        (predefined_entity, "&lt;p>", "<p>"),
        (cdata_entity, "&cdata;", "<raw>"),
        (named_char_ref, "a&#RS;b", "a\nb"),
        (refc_omitted, "&e x", "Hola Mundo x"),
        (record_end_ends_reference, "&e\rx", "Hola Mundox"),
        (entity_chain, "&a;", "x"),
    ),
    diagnostic_tests(
        (undefined_entity, "&nope;", ["general entity nope is not defined"]),
        (
            recursive_entity,
            "&loop;",
            ["entity loop is referenced while it is open"]
        ),
        (
            unknown_function_name,
            "&#FOO;",
            ["`FOO` is not the name of a function character"]
        ),
        (
            char_number_out_of_range,
            "&#1114112;",
            ["character number 1114112 is out of range"]
        ),
        (non_sgml_character, "a\u{1}", ["non SGML character number 1"]),
        (no_diagnostics, "&e;", []),
    ),
];

mod entity_level {
    use super::*;

    fn entlvl_2(syntax: &mut Syntax) {
        syntax.set_quantity(Quantity::Entlvl, 2);
    }

    test_suite![
        options(TestOption::Syntax(entlvl_2), TestOption::Entities(entities)),
        expansion_equality_tests((two_levels, "&b;", "x"),),
        diagnostic_tests(
            (
                three_levels,
                "&a;",
                ["number of open entities cannot exceed ENTLVL (2)"]
            ),
        ),
    ];
}

mod shortrefs {
    use super::*;

    test_suite![
        options(TestOption::Shortrefs(&["B", "\nB"])),
        token_tests(
            (
                blank_sequence,
                "a  b",
                [
                    (TokenKind::Char, "a"),
                    (TokenKind::Shortref(0), "  "),
                    (TokenKind::Char, "b"),
                ]
            ),
            (
                record_start_then_blanks,
                "\n\t x",
                [(TokenKind::Shortref(1), "\n\t "), (TokenKind::Char, "x")]
            ),
        ),
    ];
}

mod overlapping_blank_runs {
    use super::*;

    test_suite![
        options(TestOption::Shortrefs(&["BB", "B\r"])),
        token_tests(
            (
                run_then_record_end,
                "  \rx",
                [(TokenKind::Shortref(1), "  \r"), (TokenKind::Char, "x")]
            ),
            (
                run_without_record_end,
                "   x",
                [(TokenKind::Shortref(0), "   "), (TokenKind::Char, "x")]
            ),
        ),
    ];
}

mod element_content {
    use super::*;

    test_suite![
        options(TestOption::Mode(Mode::Econ)),
        token_tests(
            (
                separators,
                " \t<a",
                [(TokenKind::S, " "), (TokenKind::S, "\t"), (TokenKind::StagoNameStart, "<"), (TokenKind::Char, "a")]
            ),
        ),
    ];
}
