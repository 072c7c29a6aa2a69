//! Recursive-descent parser for schedule expressions
//!
//! Grammar (keywords compare case-insensitively):
//!
//! ```text
//! schedule := (pause | step)*
//! step     := "rate" "(" number [("/"|"per") unit] ")"
//!           | "even_arrivals" "(" duration ")"
//!           | "random_arrivals" "(" duration ")"
//! pause    := "pause" "(" duration ")"
//! duration := (number unit)+           -- "2 min 30 sec" = 150 s
//! unit     := ms | s | sec* | m | min* | h | hour* | d | day*
//! ```
//!
//! A rate's unit may be omitted only when the value is `0`; likewise a lone
//! `0` duration may omit its unit. `pause(d)` desugars into an explicit
//! zero-rate arrivals window that restores the previous rate afterwards.

use super::tokenizer::{tokenize, PosToken, Token};
use super::{ArrivalsKind, ScheduleStep, ThreadSchedule};
use crate::{Error, Result};

/// Parse a schedule expression into a [`ThreadSchedule`]
pub fn parse(text: &str) -> Result<ThreadSchedule> {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return integer_shorthand(trimmed);
    }
    let tokens = tokenize(text)?;
    Parser {
        tokens,
        cursor: 0,
        end: text.len(),
        last_rate: 0.0,
        steps: Vec::new(),
    }
    .run()
}

/// A bare integer `N` is a validation convenience: fire N events evenly over
/// one second, then hold idle for an hour. A fixed plan, not a grammar rule.
fn integer_shorthand(digits: &str) -> Result<ThreadSchedule> {
    let n = digits.parse::<u64>().map_err(|_| Error::Parser {
        position: 0,
        message: format!("integer shorthand out of range: {digits:?}"),
    })? as f64;
    Ok(ThreadSchedule::from_steps(vec![
        ScheduleStep::Rate { rate: n },
        ScheduleStep::Arrivals { kind: ArrivalsKind::Even, duration: 1.0 },
        ScheduleStep::Rate { rate: n },
        ScheduleStep::Rate { rate: 0.0 },
        ScheduleStep::Arrivals { kind: ArrivalsKind::Even, duration: 3600.0 },
    ]))
}

fn parser_err(position: usize, message: impl Into<String>) -> Error {
    Error::Parser { position, message: message.into() }
}

/// Seconds covered by one unit of the named time unit, by prefix match
fn unit_seconds(name: &str) -> Option<f64> {
    let unit = name.to_ascii_lowercase();
    if unit == "ms" {
        Some(0.001)
    } else if unit == "s" || unit.starts_with("sec") {
        Some(1.0)
    } else if unit == "m" || unit.starts_with("min") {
        Some(60.0)
    } else if unit == "h" || unit.starts_with("hour") {
        Some(3600.0)
    } else if unit == "d" || unit.starts_with("day") {
        Some(86400.0)
    } else {
        None
    }
}

struct Parser {
    tokens: Vec<PosToken>,
    cursor: usize,
    /// Error position for unexpected end of input
    end: usize,
    /// Most recently declared rate, used by pause desugaring
    last_rate: f64,
    steps: Vec<ScheduleStep>,
}

impl Parser {
    fn run(mut self) -> Result<ThreadSchedule> {
        while self.cursor < self.tokens.len() {
            let PosToken { position, token } = self.tokens[self.cursor].clone();
            let Token::Identifier(name) = token else {
                return Err(parser_err(
                    position,
                    format!("expected a keyword, found {:?}", token.image()),
                ));
            };
            self.cursor += 1;
            match name.to_ascii_lowercase().as_str() {
                "rate" => self.rate_step()?,
                "even_arrivals" => self.arrivals_step(ArrivalsKind::Even)?,
                "random_arrivals" => self.arrivals_step(ArrivalsKind::Random)?,
                "pause" => self.pause_step()?,
                _ => {
                    return Err(parser_err(
                        position,
                        format!(
                            "unknown keyword {name:?}, expected rate, even_arrivals, \
                             random_arrivals or pause"
                        ),
                    ))
                }
            }
        }
        Ok(ThreadSchedule::from_steps(self.steps))
    }

    fn rate_step(&mut self) -> Result<()> {
        self.expect(&Token::OpenParen)?;
        let (value_pos, value) = self.expect_number()?;
        let divisor = match self.peek_token() {
            Some(Token::Divide) => {
                self.cursor += 1;
                self.expect_unit()?
            }
            Some(Token::Identifier(name)) if name.eq_ignore_ascii_case("per") => {
                self.cursor += 1;
                self.expect_unit()?
            }
            Some(Token::CloseParen) if value == 0.0 => 1.0,
            Some(Token::CloseParen) => {
                return Err(parser_err(
                    value_pos,
                    "a non-zero rate requires a time unit, e.g. rate(1/sec)",
                ))
            }
            _ => {
                return Err(self.err_here("expected '/', 'per' or ')' after the rate value"));
            }
        };
        self.expect(&Token::CloseParen)?;
        let rate = value / divisor;
        self.last_rate = rate;
        self.steps.push(ScheduleStep::Rate { rate });
        Ok(())
    }

    fn arrivals_step(&mut self, kind: ArrivalsKind) -> Result<()> {
        self.expect(&Token::OpenParen)?;
        let duration = self.duration()?;
        self.expect(&Token::CloseParen)?;
        self.steps.push(ScheduleStep::Arrivals { kind, duration });
        Ok(())
    }

    /// `pause(d)` always runs at rate 0 regardless of the surrounding rates,
    /// then restores the prior rate. The leading `Rate(r)` keeps a preceding
    /// arrivals window ramping toward `r` instead of toward the pause's 0.
    fn pause_step(&mut self) -> Result<()> {
        self.expect(&Token::OpenParen)?;
        let duration = self.duration()?;
        self.expect(&Token::CloseParen)?;
        let rate = self.last_rate;
        if rate == 0.0 {
            self.steps.push(ScheduleStep::Arrivals { kind: ArrivalsKind::Even, duration });
            self.steps.push(ScheduleStep::Rate { rate: 0.0 });
        } else {
            self.steps.push(ScheduleStep::Rate { rate });
            self.steps.push(ScheduleStep::Rate { rate: 0.0 });
            self.steps.push(ScheduleStep::Arrivals { kind: ArrivalsKind::Even, duration });
            self.steps.push(ScheduleStep::Rate { rate: 0.0 });
            self.steps.push(ScheduleStep::Rate { rate });
        }
        Ok(())
    }

    /// Sum of `number unit` terms; chaining stops at the first non-number
    fn duration(&mut self) -> Result<f64> {
        let mut total = 0.0;
        let mut first = true;
        loop {
            let (value_pos, value) = self.expect_number()?;
            match self.peek_token() {
                Some(Token::Identifier(name)) => {
                    let unit_pos = self.tokens[self.cursor].position;
                    self.cursor += 1;
                    let secs = unit_seconds(&name).ok_or_else(|| {
                        parser_err(unit_pos, format!("unknown time unit {name:?}"))
                    })?;
                    total += value * secs;
                }
                Some(Token::CloseParen) if first && value == 0.0 => {
                    return Ok(0.0);
                }
                _ => {
                    return Err(parser_err(
                        value_pos,
                        "expected a time unit after the duration value",
                    ))
                }
            }
            first = false;
            if !matches!(self.peek_token(), Some(Token::Number(_))) {
                return Ok(total);
            }
        }
    }

    fn expect_unit(&mut self) -> Result<f64> {
        match self.tokens.get(self.cursor).cloned() {
            Some(PosToken { position, token: Token::Identifier(name) }) => {
                self.cursor += 1;
                unit_seconds(&name)
                    .ok_or_else(|| parser_err(position, format!("unknown time unit {name:?}")))
            }
            Some(PosToken { position, token }) => Err(parser_err(
                position,
                format!("expected a time unit, found {:?}", token.image()),
            )),
            None => Err(parser_err(self.end, "unexpected end of schedule, expected a time unit")),
        }
    }

    fn expect_number(&mut self) -> Result<(usize, f64)> {
        match self.tokens.get(self.cursor).cloned() {
            Some(PosToken { position, token: Token::Number(text) }) => {
                self.cursor += 1;
                let value = text.parse::<f64>().map_err(|_| {
                    parser_err(position, format!("invalid number {text:?}"))
                })?;
                Ok((position, value))
            }
            Some(PosToken { position, token }) => Err(parser_err(
                position,
                format!("expected a number, found {:?}", token.image()),
            )),
            None => Err(parser_err(self.end, "unexpected end of schedule, expected a number")),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.tokens.get(self.cursor) {
            Some(found) if found.token == *expected => {
                self.cursor += 1;
                Ok(())
            }
            Some(found) => Err(parser_err(
                found.position,
                format!("expected {:?}, found {:?}", expected.image(), found.token.image()),
            )),
            None => Err(parser_err(
                self.end,
                format!("unexpected end of schedule, expected {:?}", expected.image()),
            )),
        }
    }

    fn peek_token(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|t| t.token.clone())
    }

    fn err_here(&self, message: &str) -> Error {
        let position = self.tokens.get(self.cursor).map_or(self.end, |t| t.position);
        parser_err(position, message)
    }
}
