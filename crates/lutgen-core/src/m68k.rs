//! Built-in grammar for the first instruction word of the 68000-family
//! immediate, bit-manipulation, and module-call groups (opcode line `0000`).

use crate::error::GrammarError;
use crate::grammar::{Grammar, Pattern, PatternRegistry, Template, TemplateTable};

/// Field patterns.
///
/// `EA` is the 6-bit mode/register field. Mode `111` only takes register
/// numbers `000` and `001` (absolute short and long); `CEA` is the subset
/// of control addressing modes.
#[must_use]
pub fn patterns() -> Vec<Pattern> {
    vec![
        Pattern::new("b", vec![symbols![0], symbols![1]]),
        Pattern::new("S", vec![symbols![0, 0], symbols![0, 1], symbols![1, 0]]),
        Pattern::new(
            "EA",
            vec![
                symbols![0, 0, 0, "Xn"],
                symbols![0, 0, 1, "Xn"],
                symbols![0, 1, 0, "Xn"],
                symbols![0, 1, 1, "Xn"],
                symbols![1, 0, 0, "Xn"],
                symbols![1, 0, 1, "Xn"],
                symbols![1, 1, 0, "Xn"],
                symbols![1, 1, 1, "M111Xn"],
            ],
        ),
        Pattern::new(
            "CEA",
            vec![
                symbols![0, 1, 0, "Xn"],
                symbols![1, 0, 1, "Xn"],
                symbols![1, 1, 0, "Xn"],
                symbols![1, 1, 1, "M111Xn"],
                symbols![1, 1, 1, 0, 1, 0],
                symbols![1, 1, 1, 0, 1, 1],
            ],
        ),
        Pattern::new(
            "Xn",
            vec![
                symbols![0, 0, 0],
                symbols![0, 0, 1],
                symbols![0, 1, 0],
                symbols![0, 1, 1],
                symbols![1, 0, 0],
                symbols![1, 0, 1],
                symbols![1, 1, 0],
                symbols![1, 1, 1],
            ],
        ),
        Pattern::new("M111Xn", vec![symbols![0, 0, 0], symbols![0, 0, 1]]),
        Pattern::new(
            "COND",
            vec![
                symbols![0, 0, 0, 0],
                symbols![0, 0, 0, 1],
                symbols![0, 0, 1, 0],
                symbols![0, 0, 1, 1],
                symbols![0, 1, 0, 0],
                symbols![0, 1, 0, 1],
                symbols![0, 1, 1, 0],
                symbols![0, 1, 1, 1],
                symbols![1, 0, 0, 0],
                symbols![1, 0, 0, 1],
                symbols![1, 0, 1, 0],
                symbols![1, 0, 1, 1],
                symbols![1, 1, 0, 0],
                symbols![1, 1, 0, 1],
                symbols![1, 1, 1, 0],
                symbols![1, 1, 1, 1],
            ],
        ),
    ]
}

/// Per-mnemonic templates.
///
/// CMP2 and CHK2 share their first word; the extension word tells them
/// apart at execution time.
#[must_use]
pub fn templates() -> Vec<Template> {
    vec![
        Template::new("ORI to CCR", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0]),
        Template::new("ORI to SR", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0]),
        Template::new("ORI", symbols![0, 0, 0, 0, 0, 0, 0, 0, "S", "EA"]),
        Template::new("ANDI to CCR", symbols![0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0]),
        Template::new("ANDI to SR", symbols![0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 1, 1, 0, 0]),
        Template::new("ANDI", symbols![0, 0, 0, 0, 0, 0, 1, 0, "S", "EA"]),
        Template::new("SUBI", symbols![0, 0, 0, 0, 0, 1, 0, 0, "S", "EA"]),
        Template::new("RTM", symbols![0, 0, 0, 0, 0, 1, 1, 0, 1, 1, 0, 0, "b", "Xn"]),
        Template::new("CALLM", symbols![0, 0, 0, 0, 0, 1, 1, 0, 1, 1, "CEA"]),
        Template::new("ADDI", symbols![0, 0, 0, 0, 0, 1, 1, 0, "S", "EA"]),
        Template::new("CMP2/CHK2", symbols![0, 0, 0, 0, 0, "S", 0, 1, 1, "EA"]),
        Template::new("EORI to CCR", symbols![0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0]),
        Template::new("EORI to SR", symbols![0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 0, 0]),
        Template::new("EORI", symbols![0, 0, 0, 0, 1, 0, 1, 0, "S", "EA"]),
        Template::new("CMPI", symbols![0, 0, 0, 0, 1, 1, 0, 0, "S", "EA"]),
        Template::new("BTST", symbols![0, 0, 0, 0, 1, 0, 0, 0, 0, 0, "EA"]),
        Template::new("BCHG", symbols![0, 0, 0, 0, 1, 0, 0, 0, 0, 1, "EA"]),
        Template::new("BCLR", symbols![0, 0, 0, 0, 1, 0, 0, 0, 1, 0, "EA"]),
        Template::new("BSET", symbols![0, 0, 0, 0, 1, 0, 0, 0, 1, 1, "EA"]),
        Template::new("MOVES", symbols![0, 0, 0, 0, 1, 1, 1, 0, "S", "EA"]),
        Template::new("CAS2", symbols![0, 0, 0, 0, 1, "S", 0, 1, 1, 1, 1, 1, 1, 0, 0]),
    ]
}

/// The complete built-in grammar.
///
/// # Errors
///
/// Returns `DuplicatePattern`, `EmptyPattern`, or `DuplicateMnemonic` if
/// the tables above are edited into an inconsistent state.
pub fn grammar() -> Result<Grammar, GrammarError> {
    Ok(Grammar {
        patterns: PatternRegistry::try_from(patterns())?,
        templates: TemplateTable::try_from(templates())?,
    })
}
