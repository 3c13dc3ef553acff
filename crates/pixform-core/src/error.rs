use crate::symbols::Arity;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unknown operator: '{0}'")]
    UnknownOperator(char),
    #[error("unknown constant: '{0}'")]
    UnknownConstant(String),
    #[error("unknown function: '{0}()'")]
    UnknownFunction(String),
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),
    #[error("got the operator '{0}' without any left operand")]
    MissingLeftOperand(char),
    #[error("got the operator '{0}' without any right operand")]
    MissingRightOperand(char),
    #[error("unmatched ')' at position {0}")]
    UnmatchedParenthesis(usize),
    #[error("unexpected '{0}' after closing parenthesis")]
    Trailing(String),
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("function '{function}()' {arity}, got {found}")]
    Arity {
        function: &'static str,
        arity: Arity,
        found: usize,
    },
    #[error("argument {index} of function '{function}()' is invalid: {source}")]
    Argument {
        function: &'static str,
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Innermost error, skipping argument wrappers.
    pub fn root_cause(&self) -> &ParseError {
        let mut err = self;
        while let Self::Argument { source, .. } = err {
            err = &**source;
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_arguments() {
        let err = ParseError::Argument {
            function: "min",
            index: 1,
            source: Box::new(ParseError::Argument {
                function: "abs",
                index: 0,
                source: Box::new(ParseError::UnknownConstant("foo".into())),
            }),
        };
        assert_eq!(err.root_cause(), &ParseError::UnknownConstant("foo".into()));
        assert_eq!(ParseError::Empty.root_cause(), &ParseError::Empty);
    }

    #[test]
    fn test_messages() {
        let err = ParseError::Arity { function: "abs", arity: Arity::One, found: 2 };
        assert_eq!(err.to_string(), "function 'abs()' takes exactly one argument, got 2");
        assert_eq!(
            ParseError::UnknownOperator('?').to_string(),
            "unknown operator: '?'"
        );
        assert_eq!(
            ParseError::TooDeep { limit: 256 }.to_string(),
            "expression nests deeper than 256 levels"
        );
    }
}
