#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SyntaxKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    COLON,
    EQ,
    SEMICOLON,

    FN_KW,
    LET_KW,
    RETURN_KW,
    IF_KW,
    ELSE_KW,

    NAME,
    NUMBER,
    STRING,
    BINARY_OPERATOR,

    UNKNOWN,
    /// Zero-width placeholder for an expected-but-absent token.
    MISSING,
    EOF,

    SOURCE_FILE,
    FUNCTION,
    PARAM_LIST,
    PARAM,
    BLOCK,
    LET_STMT,
    RETURN_STMT,
    EXPR_STMT,
    BINARY_EXPR,
    CALL_EXPR,
    PAREN_EXPR,
    LITERAL,
    NAME_REF,
    ERROR,
}
