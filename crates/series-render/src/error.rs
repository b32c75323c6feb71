use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// A `{` with no matching `}`.
    UnclosedGroup,
    /// A `}` with no matching `{`.
    UnexpectedClose(usize),
    UnknownCommand(String),
    MissingArgument(String),
    DoubleScript(char),
    /// Groups, arguments or scripts nested past the given limit.
    TooDeep(usize),
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaError::UnclosedGroup => write!(f, "unclosed group: missing '}}'"),
            FormulaError::UnexpectedClose(pos) => {
                write!(f, "unexpected '}}' at token {pos}")
            }
            FormulaError::UnknownCommand(name) => write!(f, "unknown command \\{name}"),
            FormulaError::MissingArgument(cmd) => write!(f, "missing argument for {cmd}"),
            FormulaError::DoubleScript(c) => write!(f, "double {c} script"),
            FormulaError::TooDeep(limit) => write!(f, "nesting deeper than {limit} levels"),
        }
    }
}

impl std::error::Error for FormulaError {}

pub type Result<T> = std::result::Result<T, FormulaError>;
