use super::lexer::Token;

/// Errors produced while turning query text into a [`Query`](super::Query)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("Unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter {
        /// Offending character
        character: char,
        /// Byte offset in the query text
        offset: usize,
    },

    /// A numeric literal that does not parse as a float
    #[error("Invalid number '{text}' at offset {offset}")]
    InvalidNumber {
        /// Literal text
        text: String,
        /// Byte offset in the query text
        offset: usize,
    },

    /// A token other than the one the grammar requires
    #[error("Expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        /// Description of what the grammar allows here
        expected: String,
        /// Token actually found
        found: Token,
        /// Byte offset in the query text
        offset: usize,
    },

    /// A word that is not a keyword of the language
    #[error("Unknown keyword '{word}' at offset {offset}")]
    UnknownKeyword {
        /// The unrecognized word
        word: String,
        /// Byte offset in the query text
        offset: usize,
    },

    /// The same qualifier given twice on one condition
    #[error("Duplicate qualifier {name} at offset {offset}")]
    DuplicateQualifier {
        /// Qualifier keyword
        name: String,
        /// Byte offset in the query text
        offset: usize,
    },

    /// Subqueries nested deeper than the parser accepts
    #[error("Subquery nesting exceeds {limit} levels at offset {offset}")]
    NestingTooDeep {
        /// Deepest accepted nesting
        limit: usize,
        /// Byte offset of the first subquery past the limit
        offset: usize,
    },
}
