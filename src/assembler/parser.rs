//! The Parser drives both assembler passes over the source lines and
//! turns every instruction line into a machine word.
use log::Level;

use super::ast::*;
use super::error::{AsmError, Diagnostic};
use super::labels::LabelTable;
use super::lexer::{SourceLine, Statement};
use super::operand::{memory_operands, parse_immediate, RegisterPolicy, Target};

/// Knobs that decide how forgiving the assembler is.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct Config {
    pub register_policy: RegisterPolicy,
    /// Fail lines whose branch or jump target is neither a label nor a
    /// number, instead of encoding the target as 0.
    pub strict_targets: bool,
    /// Encode the operands of `JPR`, `JRL` and `LHI` and require them.
    /// Otherwise those mnemonics take no operands and their fields are zero.
    pub full_operands: bool,
}

impl Config {
    /// Rejects every malformed operand instead of substituting defaults.
    pub fn strict() -> Self {
        Config { register_policy: RegisterPolicy::Strict, strict_targets: true, full_operands: true }
    }

    /// The operand layout `op` is decoded with under this configuration.
    pub fn shape(&self, op: Mnemonic) -> Shape {
        match op {
            Mnemonic::JPR | Mnemonic::JRL | Mnemonic::LHI if !self.full_operands => Shape::Bare,
            _ => op.shape(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Stage {
    Pass1Scanning,
    Pass2Encoding,
    Done,
}

/// One successfully encoded line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Assembled {
    pub address: u16,
    /// Zero-based source line.
    pub line: usize,
    pub instruction: Instruction,
    pub word: u16,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct Assembly {
    pub words: Vec<Assembled>,
    pub labels: LabelTable,
    /// Instruction slots counted by the first pass.
    pub slots: u16,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    pub fn machine_words(&self) -> Vec<u16> {
        self.words.iter().map(|a| a.word).collect()
    }

    /// One uppercase, four digit hex word per line.
    pub fn to_hex(&self) -> String {
        self.words.iter().map(|a| format!("{:04X}\n", a.word)).collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}

pub struct Parser {
    config: Config,
    stage: Stage,
}

impl Parser {
    pub fn new(config: Config) -> Self {
        Parser { config, stage: Stage::Pass1Scanning }
    }

    /// Run both passes, consuming the parser.
    ///
    /// Failing lines are skipped and reported; the run itself never fails.
    pub fn run(mut self, lines: &[SourceLine]) -> Assembly {
        let (labels, slots, mut diagnostics) = LabelTable::collect(lines);
        self.advance(Stage::Pass2Encoding);

        let mut words = Vec::with_capacity(slots as usize);
        let mut address: u16 = 0;

        for line in lines {
            let (mnemonic, operands) = match line.tokenize() {
                Statement::Instruction { mnemonic, operands } => (mnemonic, operands),
                Statement::Empty | Statement::Label(_) => continue,
            };

            let mut decoder = LineDecoder {
                config: &self.config,
                labels: &labels,
                address,
                operands: &operands,
                notes: Vec::new(),
            };
            let result = decoder.instruction(&mnemonic);

            for (level, note) in decoder.notes {
                diagnostics.push(Diagnostic::emit(line.index, level, note));
            }

            match result {
                Ok(instruction) => {
                    let word = instruction.assemble();
                    trace!("0x{:03X}: {} => {:04X}", address, instruction, word);
                    words.push(Assembled { address, line: line.index, instruction, word });
                }
                Err(e) => diagnostics.push(Diagnostic::emit(line.index, Level::Error, e)),
            }

            // Same accounting as the first pass, so label addresses hold.
            address = address.wrapping_add(1);
        }

        self.advance(Stage::Done);

        if words.is_empty() {
            diagnostics.push(Diagnostic::global(Level::Warn, AsmError::EmptyOutput));
        }
        info!("assembled {} of {} instruction(s)", words.len(), slots);

        Assembly { words, labels, slots, diagnostics }
    }

    fn advance(&mut self, next: Stage) {
        debug!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// Decodes the operands of a single instruction line.
struct LineDecoder<'a> {
    config: &'a Config,
    labels: &'a LabelTable,
    address: u16,
    operands: &'a [String],
    /// Problems that were papered over rather than failing the line.
    notes: Vec<(Level, AsmError)>,
}

impl<'a> LineDecoder<'a> {
    fn instruction(&mut self, mnemonic: &str) -> Result<Instruction, AsmError> {
        let op: Mnemonic = mnemonic.parse()?;
        let shape = self.config.shape(op);

        if self.operands.len() < shape.operand_count() {
            return Err(AsmError::MissingOperand {
                mnemonic: op.to_string(),
                expected: shape.operand_count(),
                found: self.operands.len(),
            });
        }

        match op.format() {
            Format::Special => Ok(Instruction::Iret),

            Format::J => Ok(Instruction::J { op, address: self.target(0)?.jump_address() }),

            Format::R => {
                let r0 = Register::default();
                let (rd, rs, rt) = match shape {
                    Shape::Arithmetic => (self.register(0)?, self.register(1)?, self.register(2)?),
                    Shape::Unary      => (self.register(0)?, self.register(1)?, r0),
                    Shape::Source     => (r0, self.register(0)?, r0),
                    Shape::Dest       => (self.register(0)?, r0, r0),
                    _                 => (r0, r0, r0),
                };
                Ok(Instruction::R { op, rs, rt, rd })
            }

            Format::I => {
                let r0 = Register::default();
                let (rs, rt, imm) = match shape {
                    Shape::Immediate => {
                        let rt = self.register(0)?;
                        (self.register(1)?, rt, self.immediate(2)?)
                    }
                    Shape::Upper => (r0, self.register(0)?, self.immediate(1)?),
                    Shape::Memory => {
                        let operands = self.operands;
                        let rt = self.register(0)?;
                        let (base, offset) = memory_operands(&operands[1], &operands[2]);
                        (self.register_token(base)?, rt, mask_immediate(parse_immediate(offset)?))
                    }
                    Shape::Compare => {
                        let rs = self.register(0)?;
                        let rt = self.register(1)?;
                        (rs, rt, self.target(2)?.branch_offset(self.address))
                    }
                    Shape::Test => (self.register(0)?, r0, self.target(1)?.branch_offset(self.address)),
                    _ => (r0, r0, 0),
                };
                Ok(Instruction::I { op, rs, rt, imm })
            }
        }
    }

    fn register(&mut self, index: usize) -> Result<Register, AsmError> {
        let operands = self.operands;
        self.register_token(&operands[index])
    }

    fn register_token(&mut self, token: &str) -> Result<Register, AsmError> {
        let mut warnings = Vec::new();
        let reg = self.config.register_policy.resolve(token, &mut warnings);
        self.notes.extend(warnings.into_iter().map(|w| (Level::Warn, w)));
        reg
    }

    fn immediate(&self, index: usize) -> Result<Immediate, AsmError> {
        parse_immediate(&self.operands[index]).map(mask_immediate)
    }

    /// Resolves a branch or jump target. Unless targets are strict, an
    /// unknown target is reported and encoded as 0.
    fn target(&mut self, index: usize) -> Result<Target, AsmError> {
        match Target::resolve(&self.operands[index], self.labels) {
            Err(e) if !self.config.strict_targets => {
                self.notes.push((Level::Error, e));
                Ok(Target::Literal(0))
            }
            other => other,
        }
    }
}

fn mask_immediate(value: i64) -> Immediate {
    (value & IMMEDIATE_MASK as i64) as Immediate
}
