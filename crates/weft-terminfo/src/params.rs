#![forbid(unsafe_code)]

//! Parameterized-capability compiler and stack machine.
//!
//! Terminfo string capabilities embed a small parameter language
//! (`%p1%d`, `%?%p1%{8}%<%t...%e...%;`, ...). Ad hoc string substitution
//! cannot handle its nested conditionals, so capabilities are compiled
//! once into a reusable operation sequence and evaluated by a tiny stack
//! machine.
//!
//! # Design
//!
//! - `compile` is a recursive-descent parse over the `%` directives,
//!   producing a `Vec<Op>`. Malformed programs (unbalanced `%?`/`%;`,
//!   unknown directives) fail here, at load time, with a descriptive
//!   error — never at render time.
//! - `CompiledCap::call` evaluates the program against a parameter slice.
//!   Evaluation is pure: a fresh stack and variable set per call, so
//!   compiling the same capability twice yields behaviorally identical
//!   functions.
//! - Conditional branches short-circuit: the untaken branch is never
//!   evaluated.
//!
//! Missing parameters and stack underflow evaluate as `0`, matching the
//! traditional `tparm` behavior; they are not errors.

use std::fmt;

/// A parameter value: most capabilities take integers, a few (`%s`, `%l`)
/// consume strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Integer parameter.
    Int(i64),
    /// String parameter (raw bytes).
    Str(Vec<u8>),
}

impl Param {
    fn as_int(&self) -> i64 {
        match self {
            Self::Int(n) => *n,
            Self::Str(_) => 0,
        }
    }
}

impl Default for Param {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Errors produced while compiling a parameter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// `%?`/`%t`/`%e`/`%;` markers do not balance.
    UnbalancedConditional {
        /// Byte offset of the offending marker (or end of input).
        at: usize,
        /// What the parser expected to find.
        expected: &'static str,
    },
    /// A `%` directive this compiler does not recognize.
    UnknownDirective {
        /// Byte offset of the directive.
        at: usize,
        /// The directive byte following `%`.
        directive: u8,
    },
    /// Input ended in the middle of a directive (`%{12`, `%'x`, bare `%`).
    TruncatedDirective {
        /// Byte offset where input ran out.
        at: usize,
    },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedConditional { at, expected } => {
                write!(f, "unbalanced conditional at byte {at}: expected {expected}")
            }
            Self::UnknownDirective { at, directive } => {
                write!(
                    f,
                    "unknown parameter directive %{} at byte {at}",
                    (*directive as char).escape_default()
                )
            }
            Self::TruncatedDirective { at } => {
                write!(f, "parameter string truncated mid-directive at byte {at}")
            }
        }
    }
}

impl std::error::Error for ParamError {}

/// Binary operators (`%+`, `%=`, `%A`, ...). Operands pop in stack order:
/// second operand on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Gt,
    Lt,
    LogicAnd,
    LogicOr,
}

impl BinOp {
    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::Mul => a.wrapping_mul(b),
            Self::Div => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_div(b)
                }
            }
            Self::Mod => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_rem(b)
                }
            }
            Self::BitAnd => a & b,
            Self::BitOr => a | b,
            Self::BitXor => a ^ b,
            Self::Eq => i64::from(a == b),
            Self::Gt => i64::from(a > b),
            Self::Lt => i64::from(a < b),
            Self::LogicAnd => i64::from(a != 0 && b != 0),
            Self::LogicOr => i64::from(a != 0 || b != 0),
        }
    }
}

/// One arm of a conditional: condition program + then-branch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CondArm {
    cond: Vec<Op>,
    then: Vec<Op>,
}

/// A compiled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    /// Emit literal bytes.
    Literal(Vec<u8>),
    /// Push parameter N (0-based).
    PushParam(u8),
    /// Push an integer constant (`%{n}` or `%'c'`).
    PushConst(i64),
    /// Pop and emit as decimal (`%d`).
    FormatDec,
    /// Pop and emit as a single character (`%c`).
    FormatChar,
    /// Pop and emit as a string (`%s`).
    FormatStr,
    /// Pop a string, push its length (`%l`).
    StrLen,
    /// Pop into variable N (`%P`).
    SetVar(u8),
    /// Push variable N (`%g`).
    GetVar(u8),
    /// Binary arithmetic/comparison/logic.
    Binary(BinOp),
    /// Logical not (`%!`).
    Not,
    /// Bitwise complement (`%~`).
    Complement,
    /// Increment the first two parameters (`%i`, 1-based addressing).
    IncrParams,
    /// `%? cond %t then [%e cond %t then]... [%e else] %;`
    Cond {
        arms: Vec<CondArm>,
        otherwise: Vec<Op>,
    },
}

/// A capability compiled into a callable escape-sequence generator.
///
/// Cheap to clone; evaluation allocates only the output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCap {
    ops: Vec<Op>,
}

/// Compile a raw capability string into a [`CompiledCap`].
///
/// The input is the capability value as stored in the database (escape
/// translation already done); only `%` directives and `$<..>` padding
/// markers are interpreted here.
///
/// # Errors
///
/// Fails on unbalanced conditionals, unknown directives, and truncated
/// input — surfaced at load time so rendering never emits partial output.
pub fn compile(src: &[u8]) -> Result<CompiledCap, ParamError> {
    let mut parser = Parser { src, pos: 0 };
    let (ops, stop) = parser.parse_seq(false)?;
    match stop {
        Stop::End => Ok(CompiledCap { ops }),
        Stop::Then | Stop::Else | Stop::Fi => Err(ParamError::UnbalancedConditional {
            at: parser.pos,
            expected: "%? before %t/%e/%;",
        }),
    }
}

/// Where a sub-program parse stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    End,
    Then,
    Else,
    Fi,
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<u8> {
        let b = self.src.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Parse ops until end of input or, when `in_cond`, a branch marker.
    fn parse_seq(&mut self, in_cond: bool) -> Result<(Vec<Op>, Stop), ParamError> {
        let mut ops = Vec::new();
        let mut literal = Vec::new();

        macro_rules! flush_literal {
            () => {
                if !literal.is_empty() {
                    ops.push(Op::Literal(std::mem::take(&mut literal)));
                }
            };
        }

        while let Some(b) = self.next() {
            if b == b'$' && self.src.get(self.pos) == Some(&b'<') {
                // Padding marker $<ms> — timing hint for slow terminals,
                // meaningless on modern emulators. Skip it.
                while let Some(p) = self.next() {
                    if p == b'>' {
                        break;
                    }
                }
                continue;
            }
            if b != b'%' {
                literal.push(b);
                continue;
            }

            let at = self.pos;
            let Some(d) = self.next() else {
                return Err(ParamError::TruncatedDirective { at });
            };
            match d {
                b'%' => literal.push(b'%'),
                b'd' => {
                    flush_literal!();
                    ops.push(Op::FormatDec);
                }
                b'c' => {
                    flush_literal!();
                    ops.push(Op::FormatChar);
                }
                b's' => {
                    flush_literal!();
                    ops.push(Op::FormatStr);
                }
                b'l' => {
                    flush_literal!();
                    ops.push(Op::StrLen);
                }
                b'i' => {
                    flush_literal!();
                    ops.push(Op::IncrParams);
                }
                b'p' => {
                    flush_literal!();
                    match self.next() {
                        Some(n @ b'1'..=b'9') => ops.push(Op::PushParam(n - b'1')),
                        Some(other) => {
                            return Err(ParamError::UnknownDirective {
                                at,
                                directive: other,
                            });
                        }
                        None => return Err(ParamError::TruncatedDirective { at }),
                    }
                }
                b'P' => {
                    flush_literal!();
                    let var = self.parse_var_name(at)?;
                    ops.push(Op::SetVar(var));
                }
                b'g' => {
                    flush_literal!();
                    let var = self.parse_var_name(at)?;
                    ops.push(Op::GetVar(var));
                }
                b'{' => {
                    flush_literal!();
                    let mut value: i64 = 0;
                    let mut negative = false;
                    let mut any = false;
                    loop {
                        match self.next() {
                            Some(b'}') => break,
                            Some(b'-') if !any && !negative => negative = true,
                            Some(digit @ b'0'..=b'9') => {
                                any = true;
                                value = value.wrapping_mul(10).wrapping_add(i64::from(digit - b'0'));
                            }
                            Some(other) => {
                                return Err(ParamError::UnknownDirective {
                                    at,
                                    directive: other,
                                });
                            }
                            None => return Err(ParamError::TruncatedDirective { at }),
                        }
                    }
                    ops.push(Op::PushConst(if negative { -value } else { value }));
                }
                b'\'' => {
                    flush_literal!();
                    let Some(ch) = self.next() else {
                        return Err(ParamError::TruncatedDirective { at });
                    };
                    if self.next() != Some(b'\'') {
                        return Err(ParamError::TruncatedDirective { at });
                    }
                    ops.push(Op::PushConst(i64::from(ch)));
                }
                b'+' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Add));
                }
                b'-' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Sub));
                }
                b'*' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Mul));
                }
                b'/' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Div));
                }
                b'm' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Mod));
                }
                b'&' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::BitAnd));
                }
                b'|' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::BitOr));
                }
                b'^' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::BitXor));
                }
                b'=' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Eq));
                }
                b'>' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Gt));
                }
                b'<' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::Lt));
                }
                b'A' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::LogicAnd));
                }
                b'O' => {
                    flush_literal!();
                    ops.push(Op::Binary(BinOp::LogicOr));
                }
                b'!' => {
                    flush_literal!();
                    ops.push(Op::Not);
                }
                b'~' => {
                    flush_literal!();
                    ops.push(Op::Complement);
                }
                b'?' => {
                    flush_literal!();
                    ops.push(self.parse_conditional(at)?);
                }
                b't' if in_cond => {
                    flush_literal!();
                    return Ok((ops, Stop::Then));
                }
                b'e' if in_cond => {
                    flush_literal!();
                    return Ok((ops, Stop::Else));
                }
                b';' if in_cond => {
                    flush_literal!();
                    return Ok((ops, Stop::Fi));
                }
                b't' | b'e' | b';' => {
                    return Err(ParamError::UnbalancedConditional {
                        at,
                        expected: "%? before %t/%e/%;",
                    });
                }
                other => {
                    return Err(ParamError::UnknownDirective {
                        at,
                        directive: other,
                    });
                }
            }
        }

        flush_literal!();
        if in_cond {
            return Err(ParamError::UnbalancedConditional {
                at: self.pos,
                expected: "%; to close %?",
            });
        }
        Ok((ops, Stop::End))
    }

    /// Parse the body of `%? ... %;` (the `%?` is already consumed).
    ///
    /// Terminfo allows elif chains: `%?c1%tb1%ec2%tb2%eb3%;`. Each
    /// condition/branch pair becomes an arm; a trailing `%e` part with no
    /// `%t` is the final else.
    fn parse_conditional(&mut self, open_at: usize) -> Result<Op, ParamError> {
        let mut arms = Vec::new();
        let mut otherwise = Vec::new();

        let (mut cond, stop) = self.parse_seq(true)?;
        if stop != Stop::Then {
            return Err(ParamError::UnbalancedConditional {
                at: open_at,
                expected: "%t after %? condition",
            });
        }

        loop {
            let (then, stop) = self.parse_seq(true)?;
            if stop == Stop::Then {
                return Err(ParamError::UnbalancedConditional {
                    at: self.pos,
                    expected: "%e or %; after %t branch",
                });
            }
            arms.push(CondArm {
                cond: std::mem::take(&mut cond),
                then,
            });
            if stop == Stop::Fi {
                break;
            }

            // After %e: either another condition (ends with %t) or the
            // final else branch (ends with %;).
            let (part, stop) = self.parse_seq(true)?;
            match stop {
                Stop::Then => cond = part,
                Stop::Fi => {
                    otherwise = part;
                    break;
                }
                Stop::Else => {
                    return Err(ParamError::UnbalancedConditional {
                        at: self.pos,
                        expected: "%t or %; after %e branch",
                    });
                }
                Stop::End => unreachable!("parse_seq(in_cond) rejects end of input"),
            }
        }

        Ok(Op::Cond { arms, otherwise })
    }

    fn parse_var_name(&mut self, at: usize) -> Result<u8, ParamError> {
        match self.next() {
            Some(c @ b'a'..=b'z') => Ok(c - b'a'),
            Some(c @ b'A'..=b'Z') => Ok(c - b'A' + 26),
            Some(other) => Err(ParamError::UnknownDirective {
                at,
                directive: other,
            }),
            None => Err(ParamError::TruncatedDirective { at }),
        }
    }
}

/// Per-call evaluation state.
struct Machine {
    stack: Vec<Param>,
    params: [Param; 9],
    vars: [Param; 52],
    out: Vec<u8>,
}

impl Machine {
    fn pop_int(&mut self) -> i64 {
        self.stack.pop().map_or(0, |p| p.as_int())
    }

    fn run(&mut self, ops: &[Op]) {
        for op in ops {
            match op {
                Op::Literal(bytes) => self.out.extend_from_slice(bytes),
                Op::PushParam(n) => self.stack.push(self.params[*n as usize].clone()),
                Op::PushConst(v) => self.stack.push(Param::Int(*v)),
                Op::FormatDec => {
                    let v = self.pop_int();
                    self.out.extend_from_slice(v.to_string().as_bytes());
                }
                Op::FormatChar => {
                    let v = self.pop_int();
                    // NUL would terminate a C capability string; tparm
                    // substitutes 0x80, and we match it.
                    let byte = (v & 0xFF) as u8;
                    self.out.push(if byte == 0 { 0x80 } else { byte });
                }
                Op::FormatStr => match self.stack.pop() {
                    Some(Param::Str(bytes)) => self.out.extend_from_slice(&bytes),
                    Some(Param::Int(v)) => self.out.extend_from_slice(v.to_string().as_bytes()),
                    None => {}
                },
                Op::StrLen => {
                    let len = match self.stack.pop() {
                        Some(Param::Str(bytes)) => bytes.len() as i64,
                        _ => 0,
                    };
                    self.stack.push(Param::Int(len));
                }
                Op::SetVar(n) => {
                    let v = self.stack.pop().unwrap_or_default();
                    self.vars[*n as usize] = v;
                }
                Op::GetVar(n) => self.stack.push(self.vars[*n as usize].clone()),
                Op::Binary(op) => {
                    let b = self.pop_int();
                    let a = self.pop_int();
                    self.stack.push(Param::Int(op.apply(a, b)));
                }
                Op::Not => {
                    let v = self.pop_int();
                    self.stack.push(Param::Int(i64::from(v == 0)));
                }
                Op::Complement => {
                    let v = self.pop_int();
                    self.stack.push(Param::Int(!v));
                }
                Op::IncrParams => {
                    for p in self.params.iter_mut().take(2) {
                        if let Param::Int(n) = p {
                            *n += 1;
                        }
                    }
                }
                Op::Cond { arms, otherwise } => {
                    let mut taken = false;
                    for arm in arms {
                        self.run(&arm.cond);
                        if self.pop_int() != 0 {
                            self.run(&arm.then);
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.run(otherwise);
                    }
                }
            }
        }
    }
}

impl CompiledCap {
    /// Evaluate with integer parameters (the common case).
    #[must_use]
    pub fn call(&self, params: &[i64]) -> Vec<u8> {
        let params: Vec<Param> = params.iter().map(|&n| Param::Int(n)).collect();
        self.call_with(&params)
    }

    /// Evaluate with mixed integer/string parameters.
    ///
    /// Missing parameters read as `Int(0)`. The evaluation is pure: no
    /// state survives between calls.
    #[must_use]
    pub fn call_with(&self, params: &[Param]) -> Vec<u8> {
        let mut machine = Machine {
            stack: Vec::with_capacity(8),
            params: std::array::from_fn(|i| params.get(i).cloned().unwrap_or_default()),
            vars: std::array::from_fn(|_| Param::default()),
            out: Vec::with_capacity(16),
        };
        machine.run(&self.ops);
        machine.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &[u8], params: &[i64]) -> Vec<u8> {
        compile(src).expect("compiles").call(params)
    }

    #[test]
    fn plain_literal_passes_through() {
        assert_eq!(run(b"\x1b[2J", &[]), b"\x1b[2J");
    }

    #[test]
    fn percent_escape() {
        assert_eq!(run(b"100%%", &[]), b"100%");
    }

    #[test]
    fn cursor_address_one_based() {
        // Canonical xterm cup: 0-based params, %i makes them 1-based.
        let cup = compile(b"\x1b[%i%p1%d;%p2%dH").unwrap();
        assert_eq!(cup.call(&[5, 10]), b"\x1b[6;11H");
        assert_eq!(cup.call(&[0, 0]), b"\x1b[1;1H");
    }

    #[test]
    fn char_format() {
        // Termcap-era cup style: coordinates as raw characters.
        assert_eq!(run(b"%p1%c", &[65]), b"A");
        // NUL maps to 0x80.
        assert_eq!(run(b"%p1%c", &[0]), [0x80]);
    }

    #[test]
    fn arithmetic_and_constants() {
        assert_eq!(run(b"%p1%{10}%+%d", &[5]), b"15");
        assert_eq!(run(b"%p1%p2%-%d", &[9, 4]), b"5");
        assert_eq!(run(b"%p1%{3}%*%d", &[7]), b"21");
        assert_eq!(run(b"%p1%{4}%/%d", &[22]), b"5");
        assert_eq!(run(b"%p1%{4}%m%d", &[22]), b"2");
        assert_eq!(run(b"%'a'%d", &[]), b"97");
    }

    #[test]
    fn division_by_zero_yields_zero() {
        assert_eq!(run(b"%p1%{0}%/%d", &[7]), b"0");
        assert_eq!(run(b"%p1%{0}%m%d", &[7]), b"0");
    }

    #[test]
    fn comparison_and_logic() {
        assert_eq!(run(b"%p1%{8}%<%d", &[3]), b"1");
        assert_eq!(run(b"%p1%{8}%<%d", &[9]), b"0");
        assert_eq!(run(b"%p1%p2%=%d", &[4, 4]), b"1");
        assert_eq!(run(b"%p1%p2%>%d", &[5, 4]), b"1");
        assert_eq!(run(b"%p1%p2%A%d", &[1, 0]), b"0");
        assert_eq!(run(b"%p1%p2%O%d", &[1, 0]), b"1");
        assert_eq!(run(b"%p1%!%d", &[0]), b"1");
        assert_eq!(run(b"%p1%~%d", &[0]), b"-1");
    }

    #[test]
    fn simple_conditional() {
        let cap = compile(b"%?%p1%tYES%eNO%;").unwrap();
        assert_eq!(cap.call(&[1]), b"YES");
        assert_eq!(cap.call(&[0]), b"NO");
    }

    #[test]
    fn conditional_without_else() {
        let cap = compile(b"A%?%p1%tB%;C").unwrap();
        assert_eq!(cap.call(&[1]), b"ABC");
        assert_eq!(cap.call(&[0]), b"AC");
    }

    #[test]
    fn elif_chain_matches_xterm_setaf() {
        // The real xterm-256color setaf: 8 base colors, 8 bright, else 256.
        let setaf =
            compile(b"\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m").unwrap();
        assert_eq!(setaf.call(&[1]), b"\x1b[31m");
        assert_eq!(setaf.call(&[9]), b"\x1b[91m");
        assert_eq!(setaf.call(&[123]), b"\x1b[38;5;123m");
    }

    #[test]
    fn nested_conditionals() {
        let cap = compile(b"%?%p1%t%?%p2%tAB%eA%;%eZ%;").unwrap();
        assert_eq!(cap.call(&[1, 1]), b"AB");
        assert_eq!(cap.call(&[1, 0]), b"A");
        assert_eq!(cap.call(&[0, 0]), b"Z");
    }

    #[test]
    fn untaken_branch_not_evaluated() {
        // The else branch sets variable x; if it ran, %gx%d would print 7.
        let cap = compile(b"%?%p1%t%{1}%Px%e%{7}%Px%;%gx%d").unwrap();
        assert_eq!(cap.call(&[1]), b"1");
        assert_eq!(cap.call(&[0]), b"7");
    }

    #[test]
    fn variables_round_trip() {
        assert_eq!(run(b"%p1%Pa%ga%ga%+%d", &[21]), b"42");
        assert_eq!(run(b"%p1%PZ%gZ%d", &[9]), b"9");
    }

    #[test]
    fn string_params() {
        let cap = compile(b"<%p1%s:%p2%l%d>").unwrap();
        let out = cap.call_with(&[Param::Str(b"hello".to_vec()), Param::Str(b"xyz".to_vec())]);
        assert_eq!(out, b"<hello:3>");
    }

    #[test]
    fn padding_markers_stripped() {
        assert_eq!(run(b"\x1b[H$<5>\x1b[2J", &[]), b"\x1b[H\x1b[2J");
    }

    #[test]
    fn unbalanced_conditionals_rejected() {
        assert!(matches!(
            compile(b"%?%p1%tX"),
            Err(ParamError::UnbalancedConditional { .. })
        ));
        assert!(matches!(
            compile(b"%p1%tX%;"),
            Err(ParamError::UnbalancedConditional { .. })
        ));
        assert!(matches!(
            compile(b"%?%p1X%;"),
            Err(ParamError::UnbalancedConditional { .. })
        ));
        assert!(matches!(
            compile(b"abc%;"),
            Err(ParamError::UnbalancedConditional { .. })
        ));
    }

    #[test]
    fn unknown_and_truncated_directives_rejected() {
        assert!(matches!(
            compile(b"%q"),
            Err(ParamError::UnknownDirective { .. })
        ));
        assert!(matches!(
            compile(b"abc%"),
            Err(ParamError::TruncatedDirective { .. })
        ));
        assert!(matches!(
            compile(b"%{12"),
            Err(ParamError::TruncatedDirective { .. })
        ));
        assert!(matches!(
            compile(b"%'x"),
            Err(ParamError::TruncatedDirective { .. })
        ));
    }

    #[test]
    fn missing_params_read_as_zero() {
        assert_eq!(run(b"%p3%d", &[]), b"0");
        assert_eq!(run(b"%d", &[]), b"0");
    }

    #[test]
    fn compile_twice_behaves_identically() {
        let src: &[u8] = b"\x1b[%?%p1%{8}%<%t3%p1%d%e38;5;%p1%d%;m";
        let a = compile(src).unwrap();
        let b = compile(src).unwrap();
        for p in [0, 1, 7, 8, 15, 16, 200, 255] {
            assert_eq!(a.call(&[p]), b.call(&[p]));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// A generator for small valid parameter programs.
        fn arb_program() -> impl Strategy<Value = Vec<u8>> {
            let atom = prop_oneof![
                Just(b"%p1".to_vec()),
                Just(b"%p2".to_vec()),
                (0i64..100).prop_map(|n| format!("%{{{n}}}").into_bytes()),
                "[ -~&&[^%$]]{0,4}".prop_map(String::into_bytes),
            ];
            let binop = prop_oneof![
                Just(b"%+".to_vec()),
                Just(b"%-".to_vec()),
                Just(b"%*".to_vec()),
                Just(b"%=".to_vec()),
                Just(b"%<".to_vec()),
            ];
            (atom.clone(), atom, binop).prop_map(|(a, b, op)| {
                let mut program = Vec::new();
                program.extend_from_slice(&a);
                program.extend_from_slice(&b);
                program.extend_from_slice(&op);
                program.extend_from_slice(b"%?%p1%t");
                program.extend_from_slice(b"%d");
                program.extend_from_slice(b"%e%p2%d%;");
                program
            })
        }

        proptest! {
            #[test]
            fn compiled_caps_are_pure(program in arb_program(), p1 in -50i64..50, p2 in -50i64..50) {
                let first = compile(&program).unwrap();
                let second = compile(&program).unwrap();
                prop_assert_eq!(first.call(&[p1, p2]), second.call(&[p1, p2]));
                // Repeated invocation of the same compiled cap is stable too.
                prop_assert_eq!(first.call(&[p1, p2]), first.call(&[p1, p2]));
            }
        }
    }
}
