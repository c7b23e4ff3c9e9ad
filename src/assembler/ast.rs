//! This AST describes the instruction set understood by the assembler.
//!
//! Every instruction is exactly one 16-bit word. The top four bits hold
//! the opcode; the rest of the word depends on the instruction format:
//!
//! ```text
//!          15-12    11-10  9-8   7-6   5-0
//! R-type   0xF      rs     rt    rd    funct
//! I-type   opcode   rs     rt    imm[7:0] (bits 7-0)
//! J-type   opcode   address[11:0] (bits 11-0)
//! IRET     0xE      0
//! ```
//!
//! Comments are prefixed with `;` or `//` and are single-line only.
//! Registers may be written as `$r1`, `r1`, `$1` or `1`.
//!
//! ```nasm
//! ADD $rd, $rs, $rt   ; also SUB AND ORR SHL SHR
//! NOT $rd, $rs        ; also TCP
//! JPR $rs             ; also JRL. rs is only read with full operands.
//! RWD $rd
//! WWD $rs
//! HLT                 ; also ENI DSI
//!
//! ADI $rt, $rs, imm   ; also ORI
//! LHI $rt, imm        ; only read with full operands, otherwise 0x6000.
//! LWD $rt, imm($rs)   ; or LWD $rt, $rs, imm. Also SWD.
//! BNE $rs, $rt, label ; also BEQ. The offset is relative to the next word.
//! BGZ $rs, label      ; also BLZ
//!
//! JMP label           ; also JAL. The address is absolute.
//! IRET
//! ```

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use super::error::AsmError;

/// Opcode shared by every R-type instruction; they differ by function code.
pub const R_TYPE_OPCODE: u16 = 0xF;

pub const IMMEDIATE_MASK: u16 = 0x00FF;
pub const ADDRESS_MASK: u16 = 0x0FFF;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    // R-type
    ADD,
    SUB,
    AND,
    ORR,
    NOT,
    TCP,
    SHL,
    SHR,
    JPR,
    JRL,
    RWD,
    WWD,
    HLT,
    ENI,
    DSI,
    // I-type
    BNE,
    BEQ,
    BGZ,
    BLZ,
    ADI,
    ORI,
    LHI,
    LWD,
    SWD,
    // J-type
    JMP,
    JAL,
    // Special
    IRET,
}

/// The three instruction formats plus the operand-less interrupt return.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    R,
    I,
    J,
    Special,
}

/// The operand layout each mnemonic is written with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Shape {
    /// `rd, rs, rt`
    Arithmetic,
    /// `rd, rs`
    Unary,
    /// `rs`
    Source,
    /// `rd`
    Dest,
    /// No operands at all.
    Bare,
    /// `rt, rs, imm`
    Immediate,
    /// `rt, imm`
    Upper,
    /// `rt, rs, imm` or `rt, imm(rs)`
    Memory,
    /// `rs, rt, target`
    Compare,
    /// `rs, target`
    Test,
    /// `target`
    Jump,
}

impl Shape {
    /// Number of operand tokens the shape requires.
    pub fn operand_count(&self) -> usize {
        use Shape::*;
        match self {
            Bare => 0,
            Source | Dest | Jump => 1,
            Unary | Upper | Test => 2,
            Arithmetic | Immediate | Memory | Compare => 3,
        }
    }
}

const MNEMONICS: [(&str, Mnemonic); 27] = [
    ("ADD", Mnemonic::ADD),
    ("SUB", Mnemonic::SUB),
    ("AND", Mnemonic::AND),
    ("ORR", Mnemonic::ORR),
    ("NOT", Mnemonic::NOT),
    ("TCP", Mnemonic::TCP),
    ("SHL", Mnemonic::SHL),
    ("SHR", Mnemonic::SHR),
    ("JPR", Mnemonic::JPR),
    ("JRL", Mnemonic::JRL),
    ("RWD", Mnemonic::RWD),
    ("WWD", Mnemonic::WWD),
    ("HLT", Mnemonic::HLT),
    ("ENI", Mnemonic::ENI),
    ("DSI", Mnemonic::DSI),
    ("BNE", Mnemonic::BNE),
    ("BEQ", Mnemonic::BEQ),
    ("BGZ", Mnemonic::BGZ),
    ("BLZ", Mnemonic::BLZ),
    ("ADI", Mnemonic::ADI),
    ("ORI", Mnemonic::ORI),
    ("LHI", Mnemonic::LHI),
    ("LWD", Mnemonic::LWD),
    ("SWD", Mnemonic::SWD),
    ("JMP", Mnemonic::JMP),
    ("JAL", Mnemonic::JAL),
    ("IRET", Mnemonic::IRET),
];

impl FromStr for Mnemonic {
    type Err = AsmError;

    /// Looks a mnemonic up case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MNEMONICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, mnemonic)| mnemonic)
            .ok_or_else(|| AsmError::UnknownMnemonic(s.to_owned()))
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Mnemonic {
    pub fn format(&self) -> Format {
        use Mnemonic::*;
        match self {
            ADD | SUB | AND | ORR | NOT | TCP | SHL | SHR |
            JPR | JRL | RWD | WWD | HLT | ENI | DSI          => Format::R,
            BNE | BEQ | BGZ | BLZ | ADI | ORI | LHI | LWD | SWD => Format::I,
            JMP | JAL                                          => Format::J,
            IRET                                               => Format::Special,
        }
    }

    /// Returns the opcode placed in bits 15-12.
    pub fn opcode(&self) -> u16 {
        use Mnemonic::*;
        match self {
            BNE  => 0x0,
            BEQ  => 0x1,
            BGZ  => 0x2,
            BLZ  => 0x3,
            ADI  => 0x4,
            ORI  => 0x5,
            LHI  => 0x6,
            LWD  => 0x7,
            SWD  => 0x8,
            JMP  => 0x9,
            JAL  => 0xA,
            IRET => 0xE,
            _    => R_TYPE_OPCODE,
        }
    }

    /// Returns the function code for R-type mnemonics.
    pub fn funct(&self) -> Option<u16> {
        use Mnemonic::*;
        match self {
            ADD => Some(0x00),
            SUB => Some(0x01),
            AND => Some(0x02),
            ORR => Some(0x03),
            NOT => Some(0x04),
            TCP => Some(0x05),
            SHL => Some(0x06),
            SHR => Some(0x07),
            JPR => Some(0x19),
            JRL => Some(0x1A),
            RWD => Some(0x1B),
            WWD => Some(0x1C),
            HLT => Some(0x1D),
            ENI => Some(0x1E),
            DSI => Some(0x1F),
            _   => None,
        }
    }

    pub fn shape(&self) -> Shape {
        use Mnemonic::*;
        match self {
            ADD | SUB | AND | ORR | SHL | SHR => Shape::Arithmetic,
            NOT | TCP                         => Shape::Unary,
            JPR | JRL | WWD                   => Shape::Source,
            RWD                               => Shape::Dest,
            HLT | ENI | DSI | IRET            => Shape::Bare,
            ADI | ORI                         => Shape::Immediate,
            LHI                               => Shape::Upper,
            LWD | SWD                         => Shape::Memory,
            BNE | BEQ                         => Shape::Compare,
            BGZ | BLZ                         => Shape::Test,
            JMP | JAL                         => Shape::Jump,
        }
    }

    fn from_funct(funct: u16) -> Option<Mnemonic> {
        MNEMONICS
            .iter()
            .map(|&(_, mnemonic)| mnemonic)
            .find(|mnemonic| mnemonic.funct() == Some(funct))
    }

    fn from_opcode(opcode: u16) -> Option<Mnemonic> {
        MNEMONICS
            .iter()
            .map(|&(_, mnemonic)| mnemonic)
            .find(|mnemonic| mnemonic.format() != Format::R && mnemonic.opcode() == opcode)
    }
}

/// A decoded instruction, ready to be packed into a word.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    R { op: Mnemonic, rs: Register, rt: Register, rd: Register },
    I { op: Mnemonic, rs: Register, rt: Register, imm: Immediate },
    J { op: Mnemonic, address: Address },
    Iret,
}

impl Instruction {
    /// Assembles the given instruction to its 16-bit machine word.
    /// Unused fields assemble to zero.
    pub fn assemble(&self) -> u16 {
        match self {
            Instruction::R { op, rs, rt, rd } => {
                (R_TYPE_OPCODE << 12)
                    | (rs.to_u16() << 10)
                    | (rt.to_u16() << 8)
                    | (rd.to_u16() << 6)
                    | op.funct().unwrap_or(0)
            }
            Instruction::I { op, rs, rt, imm } => {
                (op.opcode() << 12) | (rs.to_u16() << 10) | (rt.to_u16() << 8) | ((*imm as u16) & IMMEDIATE_MASK)
            }
            Instruction::J { op, address } => (op.opcode() << 12) | (address & ADDRESS_MASK),
            Instruction::Iret => Mnemonic::IRET.opcode() << 12,
        }
    }

    /// Decodes a machine word back into its fields.
    /// Returns None for opcodes and function codes that are not assigned.
    pub fn disassemble(word: u16) -> Option<Instruction> {
        let opcode = word >> 12;
        let rs = Register::from_field(word >> 10);
        let rt = Register::from_field(word >> 8);

        if opcode == R_TYPE_OPCODE {
            let op = Mnemonic::from_funct(word & 0x3F)?;
            let rd = Register::from_field(word >> 6);
            return Some(Instruction::R { op, rs, rt, rd });
        }

        match Mnemonic::from_opcode(opcode)? {
            Mnemonic::IRET => Some(Instruction::Iret),
            op if op.format() == Format::J => Some(Instruction::J { op, address: word & ADDRESS_MASK }),
            op => Some(Instruction::I { op, rs, rt, imm: (word & IMMEDIATE_MASK) as Immediate }),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::R { op, rs, rt, rd } => match op.shape() {
                Shape::Arithmetic => write!(f, "{} {}, {}, {}", op, rd, rs, rt),
                Shape::Unary      => write!(f, "{} {}, {}", op, rd, rs),
                Shape::Source     => write!(f, "{} {}", op, rs),
                Shape::Dest       => write!(f, "{} {}", op, rd),
                _                 => write!(f, "{}", op),
            },
            // Branch offsets are shown signed.
            Instruction::I { op, rs, rt, imm } => match op.shape() {
                Shape::Immediate => write!(f, "{} {}, {}, {}", op, rt, rs, imm),
                Shape::Upper     => write!(f, "{} {}, {}", op, rt, imm),
                Shape::Memory    => write!(f, "{} {}, {}({})", op, rt, imm, rs),
                Shape::Compare   => write!(f, "{} {}, {}, {}", op, rs, rt, imm as i8),
                _                => write!(f, "{} {}, {}", op, rs, imm as i8),
            },
            Instruction::J { op, address } => write!(f, "{} 0x{:03X}", op, address),
            Instruction::Iret => write!(f, "IRET"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "$r{}", *self as u8)
    }
}

impl TryFrom<u8> for Register {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Register::*;
        // Register fields are two bits wide.
        match value {
            0 => Ok(R0),
            1 => Ok(R1),
            2 => Ok(R2),
            3 => Ok(R3),
            _ => Err("registers may only have values from 0-3 inclusive".to_owned()),
        }
    }
}

impl Default for Register {
    fn default() -> Self {
        Register::R0
    }
}

impl Register {
    /// Convert the register to its binary field value.
    pub fn to_u16(&self) -> u16 {
        *self as u16
    }

    /// Reads the two low bits of `bits` as a register field.
    fn from_field(bits: u16) -> Register {
        use Register::*;
        match bits & 0b11 {
            0 => R0,
            1 => R1,
            2 => R2,
            _ => R3,
        }
    }
}

pub type Immediate = u8;

/// A 12-bit absolute instruction address.
pub type Address = u16;
