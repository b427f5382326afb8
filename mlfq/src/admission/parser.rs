/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! This module contains a parser for one workload line in the form
//! `exec <program> (<int>[, <int>]*)`, eg: `exec ./cpu-task (8, 500)`.

use nom::{IResult, Parser,
          bytes::complete::tag,
          character::complete::{char, i64 as int_arg, space0, space1},
          multi::separated_list1,
          sequence::delimited};
use smallvec::SmallVec;

/// Integer arguments handed to the child program, in argv order.
pub type ArgList = SmallVec<[i64; 8]>;

/// One admitted workload entry: the program to execute and its integer
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub program: String,
    pub args: ArgList,
}

/// Parse function that generates an [`ExecRequest`] from a valid workload
/// line. Trailing whitespace is absorbed.
///
/// # Errors
///
/// Returns an error if:
/// - The line doesn't start with the `exec` keyword
/// - The program name is missing
/// - The parenthesized argument list is missing, empty, or not
///   comma-separated integers
pub fn parse_exec_line(input: &str) -> IResult<&str, ExecRequest> {
    let (input, _) = tag("exec")(input)?;
    let (input, _) = space1(input)?;
    let (input, program) = program_name::parse(input)?;
    let (input, _) = space0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list1(char(','), delimited(space0, int_arg, space0)),
        char(')'),
    )
    .parse(input)?;
    let (input, _) = space0(input)?;
    Ok((
        input,
        ExecRequest {
            program: program.to_string(),
            args: args.into_iter().collect(),
        },
    ))
}

mod program_name {
    use nom::{IResult, bytes::complete::take_while1};

    pub fn parse(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| !c.is_whitespace() && c != '(')(input)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;
    use test_case::test_case;

    use super::*;

    #[test]
    fn parse_single_argument() {
        let (rest, request) = parse_exec_line("exec ./cpu-task (8)").unwrap();
        assert_eq!(rest, "");
        assert_eq!(request.program, "./cpu-task");
        let expected: ArgList = smallvec![8_i64];
        assert_eq!(request.args, expected);
    }

    #[test]
    fn parse_multiple_arguments_with_spaces() {
        let (rest, request) =
            parse_exec_line("exec /bin/io-task (4, 2,  500)   ").unwrap();
        assert_eq!(rest, "");
        assert_eq!(request.program, "/bin/io-task");
        assert_eq!(request.args.as_slice(), [4, 2, 500]);
    }

    #[test]
    fn parse_negative_argument() {
        let (_, request) = parse_exec_line("exec prog (-1)").unwrap();
        assert_eq!(request.args.as_slice(), [-1]);
    }

    #[test_case("exec prog ()" ; "empty argument list")]
    #[test_case("exec prog" ; "missing argument list")]
    #[test_case("exec (1)" ; "missing program")]
    #[test_case("execute prog (1)" ; "wrong keyword spacing")]
    #[test_case("exec prog (1, two)" ; "non integer argument")]
    #[test_case("exec prog (1" ; "unclosed parenthesis")]
    fn parse_rejects_malformed_lines(input: &str) {
        assert!(parse_exec_line(input).is_err());
    }
}
