//! Recursive descent parser producing a [`Query`] from tokens.

use super::lexer::{Lexer, Spanned, Token};
use super::{
    Aggregate, Clause, Condition, ConditionKind, ConditionValue, DataKind, Output, ParseError,
    Qualifiers, Query,
};

/// Parse query text into a [`Query`]
///
/// # Example
///
/// ```
/// use msql::query::{parse, DataKind, Aggregate};
///
/// let query = parse("QUERY scannum(MS2DATA) WHERE MS2PROD=150.0:TOLERANCEPPM=10")?;
/// assert_eq!(query.output.data_kind, DataKind::Ms2);
/// assert_eq!(query.output.aggregate, Some(Aggregate::ScanNum));
/// assert_eq!(query.conditions.len(), 1);
/// # Ok::<(), msql::query::ParseError>(())
/// ```
pub fn parse(input: &str) -> Result<Query, ParseError> {
    Parser::new(input)?.parse()
}

/// Deepest subquery nesting accepted by the parser
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser for query text
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser from query text
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse a complete query; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let query = self.parse_query()?;
        self.expect_token(Token::Eof)?;
        Ok(query)
    }

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        self.expect_token(Token::Query)?;
        let output = self.parse_output()?;

        let mut conditions = Vec::new();
        if self.current_token() == &Token::Where {
            self.advance();
            self.parse_condition_list(Clause::Where, &mut conditions)?;
        }
        if self.current_token() == &Token::Filter {
            self.advance();
            self.parse_condition_list(Clause::Filter, &mut conditions)?;
        }

        Ok(Query { conditions, output })
    }

    fn parse_output(&mut self) -> Result<Output, ParseError> {
        if let Some(data_kind) = self.try_data_kind() {
            return Ok(Output {
                data_kind,
                aggregate: None,
            });
        }

        let aggregate = match self.current_token() {
            Token::ScanSum => Aggregate::ScanSum,
            Token::ScanMz => Aggregate::ScanMz,
            Token::ScanNum => Aggregate::ScanNum,
            Token::ScanInfo => Aggregate::ScanInfo,
            Token::ScanRangeSum => Aggregate::ScanRangeSum,
            _ => return Err(self.unexpected("MS1DATA, MS2DATA or an aggregate function")),
        };
        self.advance();

        self.expect_token(Token::LeftParen)?;
        let data_kind = self
            .try_data_kind()
            .ok_or_else(|| self.unexpected("MS1DATA or MS2DATA"))?;
        self.expect_token(Token::RightParen)?;

        Ok(Output {
            data_kind,
            aggregate: Some(aggregate),
        })
    }

    fn try_data_kind(&mut self) -> Option<DataKind> {
        let kind = match self.current_token() {
            Token::Ms1Data => DataKind::Ms1,
            Token::Ms2Data => DataKind::Ms2,
            _ => return None,
        };
        self.advance();
        Some(kind)
    }

    fn parse_condition_list(
        &mut self,
        clause: Clause,
        conditions: &mut Vec<Condition>,
    ) -> Result<(), ParseError> {
        loop {
            conditions.push(self.parse_condition(clause)?);
            if self.current_token() == &Token::And {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    fn parse_condition(&mut self, clause: Clause) -> Result<Condition, ParseError> {
        let kind = match self.current_token() {
            Token::Ms1Mz => ConditionKind::Ms1Mz,
            Token::Ms2Prod => ConditionKind::Ms2Product,
            Token::Ms2Prec => ConditionKind::Ms2Precursor,
            Token::Ms2Nl => ConditionKind::Ms2NeutralLoss,
            _ => return Err(self.unexpected("MS1MZ, MS2PROD, MS2PREC or MS2NL")),
        };
        self.advance();
        self.expect_token(Token::Eq)?;

        let value = self.parse_values()?;
        let qualifiers = self.parse_qualifiers()?;

        Ok(Condition {
            clause,
            kind,
            value,
            qualifiers,
        })
    }

    fn parse_values(&mut self) -> Result<Vec<ConditionValue>, ParseError> {
        if self.current_token() != &Token::LeftParen {
            return Ok(vec![self.parse_value()?]);
        }
        self.advance();

        if self.current_token() == &Token::Query {
            if self.depth >= MAX_NESTING_DEPTH {
                return Err(ParseError::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                    offset: self.current_offset(),
                });
            }
            self.depth += 1;
            let subquery = self.parse_query()?;
            self.depth -= 1;
            self.expect_token(Token::RightParen)?;
            return Ok(vec![ConditionValue::Subquery(Box::new(subquery))]);
        }

        let mut values = vec![self.parse_value()?];
        while self.current_token() == &Token::Or {
            self.advance();
            values.push(self.parse_value()?);
        }
        self.expect_token(Token::RightParen)?;
        Ok(values)
    }

    fn parse_value(&mut self) -> Result<ConditionValue, ParseError> {
        match self.current_token() {
            Token::Variable => {
                self.advance();
                let offset = match self.current_token() {
                    Token::Plus => {
                        self.advance();
                        Some(self.parse_number()?)
                    }
                    Token::Minus => {
                        self.advance();
                        Some(-self.parse_number()?)
                    }
                    _ => None,
                };
                Ok(ConditionValue::Variable { offset })
            }
            Token::Minus => {
                self.advance();
                Ok(ConditionValue::Literal(-self.parse_number()?))
            }
            Token::Number(_) => Ok(ConditionValue::Literal(self.parse_number()?)),
            _ => Err(self.unexpected("a number, X or a parenthesized value list")),
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        match *self.current_token() {
            Token::Number(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("a number")),
        }
    }

    fn parse_qualifiers(&mut self) -> Result<Option<Qualifiers>, ParseError> {
        let mut qualifiers: Option<Qualifiers> = None;

        while self.current_token() == &Token::Colon {
            self.advance();
            let offset = self.current_offset();
            let token = self.current_token().clone();
            let entry = qualifiers.get_or_insert_with(Qualifiers::default);
            let slot = match token {
                Token::TolerancePpm => &mut entry.ppm_tolerance,
                Token::ToleranceMz => &mut entry.mz_tolerance,
                _ => return Err(self.unexpected("TOLERANCEPPM or TOLERANCEMZ")),
            };
            if slot.is_some() {
                return Err(ParseError::DuplicateQualifier {
                    name: token.to_string(),
                    offset,
                });
            }
            self.advance();
            self.expect_token(Token::Eq)?;
            *slot = Some(self.parse_number()?);
        }

        Ok(qualifiers)
    }

    fn current_token(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|s| s.offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current_token() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token().clone(),
            offset: self.current_offset(),
        }
    }
}
