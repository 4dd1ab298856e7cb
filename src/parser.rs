//! Command script parser.
//!
//! Grammar, one command per line:
//!
//! ```text
//! command := name "(" [int ("," int)*] ")" | "Quit"
//! ```
//!
//! Whitespace around names and arguments is ignored; blank lines are skipped.
//!
//! # Example
//! ```
//! use gator_delivery::models::Command;
//! use gator_delivery::parser::parse_script;
//!
//! let script = "createOrder(1, 0, 50, 10)\nprint(0, 100)\nQuit()";
//! let commands = parse_script(script).unwrap();
//! assert_eq!(commands.len(), 3);
//! assert_eq!(commands[2], Command::Quit);
//! ```

use crate::error::{ParseError, ParseErrorKind};
use crate::models::Command;

/// Parses a whole script. The first malformed line aborts parsing.
pub fn parse_script(script: &str) -> Result<Vec<Command>, ParseError> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line).map_err(|kind| ParseError::new(i + 1, kind)))
        .collect()
}

/// Parses a single command line.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    parse_line(line).map_err(|kind| ParseError::new(1, kind))
}

fn parse_line(line: &str) -> Result<Command, ParseErrorKind> {
    let line = line.trim();
    if line == "Quit" {
        return Ok(Command::Quit);
    }

    let (name, rest) = line
        .split_once('(')
        .ok_or(ParseErrorKind::MissingParenthesis)?;
    let body = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or(ParseErrorKind::MissingParenthesis)?;
    let args = parse_args(body)?;

    match name.trim() {
        "createOrder" => {
            let [order_id, creation_time, value, delivery_duration] =
                arity::<4>("createOrder", "4", &args)?;
            Ok(Command::CreateOrder {
                order_id,
                creation_time,
                value,
                delivery_duration,
            })
        }
        "cancelOrder" => {
            let [order_id, current_time] = arity::<2>("cancelOrder", "2", &args)?;
            Ok(Command::CancelOrder {
                order_id,
                current_time,
            })
        }
        "updateTime" => {
            let [order_id, current_time, new_delivery_duration] =
                arity::<3>("updateTime", "3", &args)?;
            Ok(Command::UpdateTime {
                order_id,
                current_time,
                new_delivery_duration,
            })
        }
        "print" => match args.as_slice() {
            &[order_id] => Ok(Command::PrintOrder { order_id }),
            &[time1, time2] => Ok(Command::PrintRange { time1, time2 }),
            _ => Err(ParseErrorKind::WrongArity {
                command: "print",
                expected: "1 or 2",
                found: args.len(),
            }),
        },
        "getRankOfOrder" => {
            let [order_id] = arity::<1>("getRankOfOrder", "1", &args)?;
            Ok(Command::GetRankOfOrder { order_id })
        }
        "Quit" => {
            arity::<0>("Quit", "0", &args)?;
            Ok(Command::Quit)
        }
        other => Err(ParseErrorKind::UnknownCommand(other.to_string())),
    }
}

fn parse_args(body: &str) -> Result<Vec<i64>, ParseErrorKind> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',')
        .map(|arg| {
            let arg = arg.trim();
            arg.parse::<i64>()
                .map_err(|_| ParseErrorKind::InvalidInteger(arg.to_string()))
        })
        .collect()
}

fn arity<const N: usize>(
    command: &'static str,
    expected: &'static str,
    args: &[i64],
) -> Result<[i64; N], ParseErrorKind> {
    <[i64; N]>::try_from(args).map_err(|_| ParseErrorKind::WrongArity {
        command,
        expected,
        found: args.len(),
    })
}
