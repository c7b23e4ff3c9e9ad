//! Turns operand tokens into register numbers, immediates and
//! branch or jump targets.
use std::convert::TryFrom;

use super::ast::Register;
use super::error::AsmError;
use super::labels::LabelTable;

/// What to do with a register operand that does not parse.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RegisterPolicy {
    /// Substitute `$r0` and report a warning. The line is still encoded.
    Lenient,
    /// Fail the line with `MalformedOperand`.
    Strict,
}

impl Default for RegisterPolicy {
    fn default() -> Self {
        RegisterPolicy::Lenient
    }
}

impl RegisterPolicy {
    /// Resolves a register token, pushing any substituted failure onto `warnings`.
    pub fn resolve(&self, token: &str, warnings: &mut Vec<AsmError>) -> Result<Register, AsmError> {
        match parse_register(token) {
            Ok(reg) => Ok(reg),
            Err(e) => match self {
                RegisterPolicy::Strict => Err(e),
                RegisterPolicy::Lenient => {
                    warnings.push(e);
                    Ok(Register::default())
                }
            },
        }
    }
}

/// Accepts `$r1`, `r1`, `R1`, `$1` and `1`.
pub fn parse_register(token: &str) -> Result<Register, AsmError> {
    let digits = token.trim_start_matches(|c: char| c == '$' || c == 'r' || c == 'R');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AsmError::MalformedOperand(token.to_owned()));
    }

    digits
        .parse::<u8>()
        .ok()
        .and_then(|id| Register::try_from(id).ok())
        .ok_or_else(|| AsmError::MalformedOperand(token.to_owned()))
}

/// Parses a numeric literal with an optional sign and an optional
/// `0x`, `0o` or `0b` base prefix. Decimal otherwise.
///
/// The value is not range checked; the encoder masks it to its field.
/// Literals wider than 64 bits wrap, which keeps every bit a field can hold.
pub fn parse_immediate(token: &str) -> Result<i64, AsmError> {
    let malformed = || AsmError::MalformedOperand(token.to_owned());

    let (negative, unsigned) = if let Some(rest) = token.strip_prefix('-') {
        (true, rest)
    } else {
        (false, token.strip_prefix('+').unwrap_or(token))
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, body) = if let Some(body) = lower.strip_prefix("0x") {
        (16, body)
    } else if let Some(body) = lower.strip_prefix("0o") {
        (8, body)
    } else if let Some(body) = lower.strip_prefix("0b") {
        (2, body)
    } else {
        (10, lower.as_str())
    };

    if body.is_empty() {
        return Err(malformed());
    }

    let mut magnitude: i64 = 0;
    for c in body.chars() {
        let digit = c.to_digit(radix).ok_or_else(malformed)?;
        magnitude = magnitude.wrapping_mul(radix as i64).wrapping_add(digit as i64);
    }
    Ok(if negative { magnitude.wrapping_neg() } else { magnitude })
}

/// Splits the trailing operands of `LWD`/`SWD` into `(base register, immediate)`.
///
/// The source dialect accepts both `LWD $rt, $rs, imm` and `LWD $rt, imm($rs)`,
/// and the lexer turns both into three plain tokens. The only way to tell
/// them apart is the shape of the first one: if it contains an `r` or a `$`
/// it is the base register, otherwise it is the immediate.
pub fn memory_operands<'a>(first: &'a str, second: &'a str) -> (&'a str, &'a str) {
    let lower = first.to_ascii_lowercase();
    if lower.contains('r') || lower.contains('$') {
        (first, second)
    } else {
        (second, first)
    }
}

/// Where a branch or jump operand points.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Target {
    /// A declared label, resolved to its instruction address.
    Label(u16),
    /// A numeric literal, used as written.
    Literal(i64),
}

impl Target {
    /// Labels take precedence; anything else must be a numeric literal.
    pub fn resolve(token: &str, labels: &LabelTable) -> Result<Target, AsmError> {
        if let Some(address) = labels.get(token) {
            return Ok(Target::Label(address));
        }
        parse_immediate(token)
            .map(Target::Literal)
            .map_err(|_| AsmError::UnresolvedLabel(token.to_owned()))
    }

    /// The 8-bit branch offset, relative to the word after `current`.
    pub fn branch_offset(&self, current: u16) -> u8 {
        let offset = match *self {
            Target::Label(address) => address as i64 - (current as i64 + 1),
            Target::Literal(value) => value,
        };
        (offset & 0xFF) as u8
    }

    /// The 12-bit absolute jump address.
    pub fn jump_address(&self) -> u16 {
        let address = match *self {
            Target::Label(address) => address as i64,
            Target::Literal(value) => value,
        };
        (address & 0x0FFF) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        for token in &["$r1", "r1", "R1", "$1", "1"] {
            assert_eq!(parse_register(token).ok(), Some(Register::R1), "{}", token);
        }
        assert_eq!(parse_register("$r0").ok(), Some(Register::R0));
        assert_eq!(parse_register("$R3").ok(), Some(Register::R3));

        assert!(parse_register("$r4").is_err());
        assert!(parse_register("$r").is_err());
        assert!(parse_register("$x1").is_err());
        assert!(parse_register("r1a").is_err());
        assert!(parse_register("-1").is_err());
        assert!(parse_register("").is_err());
    }

    #[test]
    fn test_register_policy() {
        let mut warnings = Vec::new();
        assert_eq!(RegisterPolicy::Lenient.resolve("$r2", &mut warnings).ok(), Some(Register::R2));
        assert!(warnings.is_empty());

        assert_eq!(RegisterPolicy::Lenient.resolve("$bogus", &mut warnings).ok(), Some(Register::R0));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], AsmError::MalformedOperand(t) if t == "$bogus"));

        let mut warnings = Vec::new();
        assert!(matches!(
            RegisterPolicy::Strict.resolve("$bogus", &mut warnings),
            Err(AsmError::MalformedOperand(_))
        ));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_parse_immediate() {
        assert_eq!(parse_immediate("0").ok(), Some(0));
        assert_eq!(parse_immediate("10").ok(), Some(10));
        assert_eq!(parse_immediate("+10").ok(), Some(10));
        assert_eq!(parse_immediate("-3").ok(), Some(-3));
        assert_eq!(parse_immediate("0x1FF").ok(), Some(0x1FF));
        assert_eq!(parse_immediate("0XfF").ok(), Some(0xFF));
        assert_eq!(parse_immediate("-0x10").ok(), Some(-16));
        assert_eq!(parse_immediate("0o17").ok(), Some(0o17));
        assert_eq!(parse_immediate("0b1010").ok(), Some(0b1010));
        assert_eq!(parse_immediate("0B11").ok(), Some(3));

        assert_eq!(parse_immediate("0x1FFFFFFFFFFFFFFFFF").ok().map(|v| v & 0xFF), Some(0xFF));
        assert_eq!(parse_immediate("-0x1FFFFFFFFFFFFFFFFF").ok().map(|v| v & 0xFF), Some(0x01));
        assert_eq!(parse_immediate("99999999999999999999999").ok().map(|v| v & 0xFFF),
            Some((99999999999999999999999u128 & 0xFFF) as i64));

        assert!(parse_immediate("").is_err());
        assert!(parse_immediate("-").is_err());
        assert!(parse_immediate("0x").is_err());
        assert!(parse_immediate("0b102").is_err());
        assert!(parse_immediate("0f10").is_err());
        assert!(parse_immediate("--1").is_err());
        assert!(parse_immediate("0x+1").is_err());
        assert!(parse_immediate("$r1").is_err());
        assert!(parse_immediate("loop").is_err());
    }

    #[test]
    fn test_memory_operands() {
        // LWD $r1, 4($r2)
        assert_eq!(memory_operands("4", "$r2"), ("$r2", "4"));
        // LWD $r1, $r2, 4
        assert_eq!(memory_operands("$r2", "4"), ("$r2", "4"));
        assert_eq!(memory_operands("R2", "4"), ("R2", "4"));
        assert_eq!(memory_operands("$2", "0x4"), ("$2", "0x4"));
        // A bare register number in the first slot reads as an immediate.
        assert_eq!(memory_operands("2", "4"), ("4", "2"));
    }

    #[test]
    fn test_target() {
        let mut labels = LabelTable::new();
        labels.insert("loop", 2);
        labels.insert("end", 10);

        assert_eq!(Target::resolve("loop", &labels).ok(), Some(Target::Label(2)));
        assert_eq!(Target::resolve("0x20", &labels).ok(), Some(Target::Literal(0x20)));
        assert!(matches!(Target::resolve("LOOP", &labels), Err(AsmError::UnresolvedLabel(l)) if l == "LOOP"));

        // Backward: from 5 to 2 is -4 from the following word.
        assert_eq!(Target::Label(2).branch_offset(5), 0xFC);
        // Forward: from 5 to 10 is +4.
        assert_eq!(Target::Label(10).branch_offset(5), 0x04);
        assert_eq!(Target::Literal(-1).branch_offset(5), 0xFF);
        assert_eq!(Target::Literal(0x1FF).branch_offset(0), 0xFF);

        assert_eq!(Target::Label(10).jump_address(), 10);
        assert_eq!(Target::Literal(0x1234).jump_address(), 0x234);
        assert_eq!(Target::Literal(-1).jump_address(), 0xFFF);
    }
}
