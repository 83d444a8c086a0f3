//! AVR assembly emission for the ATmega328P (Arduino Uno).
//!
//! The machine model is 8-bit integer: every TAC value lives in one byte.
//! Temporaries are register-resident (first-fit pool over `r16..r31`);
//! named memories are SRAM-resident and travel through `lds`/`sts`. All
//! program output goes over the UART (USART0), initialized for 8N1 with
//! double-speed mode so the timing matches stock Arduino bootloaders.
//!
//! The emitted program has a fixed skeleton: `main` sets up the stack and
//! UART, prints a banner, calls `programa_principal` (the TAC-derived
//! body) and parks in `loop_forever`. Helper routines provide byte
//! transmission, flash-resident string printing and unsigned 8-bit decimal
//! printing with leading-zero suppression.
//!
//! Division, remainder, exponentiation and real division have no 8-bit
//! runtime; those operations emit a placeholder comment and reserve the
//! destination register.

use rpnc_tac::{const_value, is_const, is_temp, Instr, TacOp};

use crate::error::CodegenError;
use crate::regs::RegisterPool;
use crate::sram::SramLayout;

/// CPU clock of the Arduino Uno.
const F_CPU: u32 = 16_000_000;

/// Options for one code generation run.
#[derive(Clone, Copy, Debug)]
pub struct AvrOptions {
    /// UART baud rate (9600 and 115200 are the supported choices)
    pub baud: u32,
    /// Emit print calls after memory writes and operations
    pub debug: bool,
}

impl Default for AvrOptions {
    fn default() -> Self {
        Self {
            baud: 9600,
            debug: false,
        }
    }
}

/// AVR assembly generator; owns the register pool and SRAM layout for the
/// duration of one emission run.
pub struct AvrGenerator {
    output: String,
    opts: AvrOptions,
    regs: RegisterPool,
    sram: SramLayout,
    cmp_counter: usize,
}

impl AvrGenerator {
    pub fn new(opts: AvrOptions) -> Self {
        Self {
            output: String::new(),
            opts,
            regs: RegisterPool::new(),
            sram: SramLayout::new(),
            cmp_counter: 0,
        }
    }

    /// UBRR value for the configured baud rate in double-speed mode.
    fn ubrr(&self) -> u32 {
        F_CPU / (8 * self.opts.baud) - 1
    }

    /// Emits the complete assembly program for the given TAC.
    pub fn generate(&mut self, instrs: &[Instr]) -> Result<String, CodegenError> {
        self.collect_named_memories(instrs);
        self.emit_header();
        self.emit_main();
        self.emit_helpers();
        self.emit_program(instrs)?;
        self.emit_sections();
        Ok(std::mem::take(&mut self.output))
    }

    /// Assigns SRAM cells to every named memory, in order of appearance,
    /// so the `.equ` table can precede the code that uses it.
    fn collect_named_memories(&mut self, instrs: &[Instr]) {
        for instr in instrs {
            if let Some(dst) = instr.dst() {
                if is_named(dst) {
                    self.sram.named_addr(dst);
                }
            }
            for operand in instr.operands() {
                if is_named(operand) {
                    self.sram.named_addr(operand);
                }
            }
        }
    }

    // =========================================================================
    // OUTPUT PRIMITIVES
    // =========================================================================

    fn line(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn instr(&mut self, text: impl AsRef<str>) {
        self.output.push_str("    ");
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    fn banner(&mut self, title: &str) {
        self.line(format!("; === {} ===", title));
    }

    // =========================================================================
    // SKELETON
    // =========================================================================

    fn emit_header(&mut self) {
        self.line("; ===========================================================================");
        self.line("; Generated by rpnc for the ATmega328P (Arduino Uno)");
        self.line("; ===========================================================================");
        self.blank();
        self.line("#include <avr/io.h>");
        self.blank();

        self.banner("CONSTANTS");
        self.line(".equ STACK_LOW, 0xff");
        self.line(".equ STACK_HIGH, 0x08");
        self.line(".equ SPL_ADDR, 0x3d");
        self.line(".equ SPH_ADDR, 0x3e");
        let cells: Vec<(String, u16)> = self
            .sram
            .named_cells()
            .map(|(name, addr)| (name.to_string(), addr))
            .collect();
        for (name, addr) in cells {
            self.line(format!(".equ mem_{}, {:#06x}", name, addr));
        }
        self.blank();
    }

    fn emit_main(&mut self) {
        self.banner("ENTRY POINT");
        self.line(".section .text");
        self.line(".global main");
        self.blank();
        self.line("main:");
        self.instr("; r0 stays zero except across mul");
        self.instr("clr r0");
        self.blank();
        self.instr("; stack pointer to RAMEND (0x08ff)");
        self.instr("ldi r16, STACK_LOW");
        self.instr("out SPL_ADDR, r16");
        self.instr("ldi r16, STACK_HIGH");
        self.instr("out SPH_ADDR, r16");
        self.blank();
        self.instr("call setup_uart");
        self.instr("call print_startup_message");
        self.instr("call programa_principal");
        self.blank();
        self.banner("INFINITE LOOP");
        self.line("loop_forever:");
        self.instr("rjmp loop_forever");
        self.blank();
    }

    fn emit_helpers(&mut self) {
        let ubrr = self.ubrr();
        let baud = self.opts.baud;

        self.banner("UART SETUP");
        self.line("setup_uart:");
        self.instr("push r16");
        self.instr("push r17");
        self.blank();
        self.instr("; 1. disable the UART");
        self.instr("ldi r16, 0x00");
        self.instr("sts 0xc1, r16    ; UCSR0B = 0");
        self.blank();
        self.instr("; 2. frame format 8N1");
        self.instr("ldi r16, 0x06");
        self.instr("sts 0xc2, r16    ; UCSR0C = 0b00000110");
        self.blank();
        self.instr("; 3. double speed, same as the Arduino bootloader");
        self.instr("ldi r16, 0x02");
        self.instr("sts 0xc0, r16    ; UCSR0A = 0b00000010 (U2X0=1)");
        self.blank();
        self.instr(format!(
            "; 4. UBRR = F_CPU / (8 * {}) - 1 = {}",
            baud, ubrr
        ));
        self.instr(format!("ldi r16, {}", ubrr & 0xff));
        self.instr(format!("ldi r17, {}", (ubrr >> 8) & 0xff));
        self.instr("sts 0xc4, r16    ; UBRR0L");
        self.instr("sts 0xc5, r17    ; UBRR0H");
        self.blank();
        self.instr("; 5. enable the transmitter");
        self.instr("ldi r16, 0x08");
        self.instr("sts 0xc1, r16    ; UCSR0B = TXEN0");
        self.blank();
        self.instr("; 6. let the line settle");
        self.instr("ldi r17, 255");
        self.line("uart_init_delay:");
        self.instr("dec r17");
        self.instr("brne uart_init_delay");
        self.blank();
        self.instr("pop r17");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();

        self.banner("UART: transmit byte in r16");
        self.line("uart_transmit:");
        self.instr("push r17");
        self.line("uart_wait:");
        self.instr("lds r17, 0xc0    ; UCSR0A");
        self.instr("sbrs r17, 5      ; skip when UDRE0 is set");
        self.instr("rjmp uart_wait");
        self.instr("sts 0xc6, r16    ; UDR0");
        self.instr("pop r17");
        self.instr("ret");
        self.blank();

        self.banner("UART: print flash string pointed to by Z");
        self.line("uart_print_string:");
        self.instr("push r16");
        self.instr("push ZL");
        self.instr("push ZH");
        self.line("print_loop:");
        self.instr("lpm r16, Z+");
        self.instr("tst r16");
        self.instr("breq print_done");
        self.instr("call uart_transmit");
        self.instr("rjmp print_loop");
        self.line("print_done:");
        self.instr("pop ZH");
        self.instr("pop ZL");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();

        self.banner("startup banner");
        self.line("print_startup_message:");
        self.instr("push ZL");
        self.instr("push ZH");
        self.instr("ldi ZL, lo8(msg_startup)");
        self.instr("ldi ZH, hi8(msg_startup)");
        self.instr("call uart_print_string");
        self.instr("pop ZH");
        self.instr("pop ZL");
        self.instr("ret");
        self.blank();

        self.banner("print r16 as unsigned decimal, no leading zeros");
        self.line("print_number:");
        self.instr("push r16");
        self.instr("push r17");
        self.instr("push r18");
        self.instr("ldi r18, 0       ; digit-printed flag");
        self.instr("ldi r17, 0");
        self.line("pn_hundreds:");
        self.instr("cpi r16, 100");
        self.instr("brlo pn_hundreds_done");
        self.instr("subi r16, 100");
        self.instr("inc r17");
        self.instr("rjmp pn_hundreds");
        self.line("pn_hundreds_done:");
        self.instr("tst r17");
        self.instr("breq pn_tens");
        self.instr("ldi r18, 1");
        self.instr("push r16");
        self.instr("mov r16, r17");
        self.instr("subi r16, -48    ; digit to ASCII");
        self.instr("call uart_transmit");
        self.instr("pop r16");
        self.line("pn_tens:");
        self.instr("ldi r17, 0");
        self.line("pn_tens_loop:");
        self.instr("cpi r16, 10");
        self.instr("brlo pn_tens_done");
        self.instr("subi r16, 10");
        self.instr("inc r17");
        self.instr("rjmp pn_tens_loop");
        self.line("pn_tens_done:");
        self.instr("tst r17");
        self.instr("brne pn_print_tens");
        self.instr("tst r18");
        self.instr("breq pn_units");
        self.line("pn_print_tens:");
        self.instr("push r16");
        self.instr("mov r16, r17");
        self.instr("subi r16, -48");
        self.instr("call uart_transmit");
        self.instr("pop r16");
        self.line("pn_units:");
        self.instr("subi r16, -48");
        self.instr("call uart_transmit");
        self.instr("pop r18");
        self.instr("pop r17");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();

        self.banner("CR+LF");
        self.line("print_newline:");
        self.instr("push r16");
        self.instr("ldi r16, 13");
        self.instr("call uart_transmit");
        self.instr("ldi r16, 10");
        self.instr("call uart_transmit");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();

        self.banner("single space");
        self.line("print_space:");
        self.instr("push r16");
        self.instr("ldi r16, 32");
        self.instr("call uart_transmit");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();
    }

    fn emit_program(&mut self, instrs: &[Instr]) -> Result<(), CodegenError> {
        self.banner("MAIN PROGRAM (from TAC)");
        self.line("programa_principal:");
        self.instr("push r16");
        self.instr("push r17");
        self.instr("push r18");
        self.blank();

        for instr in instrs {
            self.emit_instr(instr)?;
        }

        self.blank();
        self.instr("pop r18");
        self.instr("pop r17");
        self.instr("pop r16");
        self.instr("ret");
        self.blank();
        Ok(())
    }

    fn emit_sections(&mut self) {
        self.banner("STRINGS (flash, read with lpm)");
        self.line(".section .text");
        self.line("msg_startup:");
        self.instr(".asciz \"RPN compiler - ATmega328P\\r\\n\"");
        self.blank();
        self.line(".section .data");
        self.line("; named memories live at the mem_* addresses above");
        self.blank();
        self.banner("BSS");
        self.line(".section .bss");
        self.line("temp_vars:");
        self.instr(".space 32    ; temporaries at 0x0100..0x011f");
        self.line("named_vars:");
        self.instr(".space 26    ; named memories at 0x0120..0x0139");
    }

    // =========================================================================
    // TAC MAPPING
    // =========================================================================

    fn emit_instr(&mut self, instr: &Instr) -> Result<(), CodegenError> {
        match instr {
            Instr::Assign { dst, src } | Instr::Copy { dst, src } => {
                self.instr(format!("; {}", instr));
                self.emit_move(dst, src)
            },
            Instr::Op { dst, lhs, op, rhs } => {
                self.instr(format!("; {}", instr));
                self.emit_op(dst, lhs, *op, rhs)
            },
            Instr::Label(name) => {
                self.line(format!("{}:", name));
                Ok(())
            },
            Instr::Goto(label) => {
                self.instr(format!("rjmp {}", label));
                Ok(())
            },
            Instr::IfFalse { cond, label } => {
                self.instr(format!("; {}", instr));
                self.emit_if_false(cond, label)
            },
        }
    }

    /// Assign and Copy share one lowering: get the source into a register,
    /// then either keep it there (temp dst) or store it to SRAM (named).
    fn emit_move(&mut self, dst: &str, src: &str) -> Result<(), CodegenError> {
        if is_temp(dst) {
            let rd = self.regs.alloc(dst)?;
            if is_const(src) {
                self.instr(format!("ldi r{}, {}", rd, byte_value(src)));
            } else {
                let (rs, scratch) = self.operand_reg(src, "_temp_load")?;
                if rs != rd {
                    self.instr(format!("mov r{}, r{}", rd, rs));
                }
                self.release_scratch(scratch);
            }
        } else {
            let (rs, scratch) = if is_const(src) {
                let r = self.regs.alloc("_temp_const")?;
                self.instr(format!("ldi r{}, {}", r, byte_value(src)));
                (r, Some("_temp_const"))
            } else {
                self.operand_reg(src, "_temp_load")?
            };
            self.instr(format!("sts mem_{}, r{}", dst, rs));
            if self.opts.debug {
                self.emit_debug_print(rs, true);
            }
            self.release_scratch(scratch);
        }
        Ok(())
    }

    fn emit_op(&mut self, dst: &str, lhs: &str, op: TacOp, rhs: &str) -> Result<(), CodegenError> {
        // no 8-bit runtime for these; keep the slot, skip the arithmetic
        if matches!(
            op,
            TacOp::IntDiv | TacOp::Rem | TacOp::Pow | TacOp::RealDiv
        ) {
            if is_temp(dst) {
                self.regs.alloc(dst)?;
            }
            self.instr(format!(
                "; no runtime helper for '{}' on the 8-bit target",
                op.symbol()
            ));
            return Ok(());
        }

        let (ra, sa) = self.operand_reg(lhs, "_temp_op1")?;
        let (rb, sb) = self.operand_reg(rhs, "_temp_op2")?;
        let (rd, sd) = self.dest_reg(dst)?;

        if op.is_relational() {
            self.emit_relational(op, ra, rb, rd);
        } else {
            if rd != ra {
                self.instr(format!("mov r{}, r{}", rd, ra));
            }
            match op {
                TacOp::Add => self.instr(format!("add r{}, r{}", rd, rb)),
                TacOp::Sub => self.instr(format!("sub r{}, r{}", rd, rb)),
                TacOp::Mul => {
                    self.instr(format!("mul r{}, r{}", rd, rb));
                    self.instr(format!("mov r{}, r0    ; low byte", rd));
                    self.instr("clr r0");
                },
                _ => unreachable!("arithmetic op {:?} handled above", op),
            }
        }

        if !is_temp(dst) {
            self.instr(format!("sts mem_{}, r{}", dst, rd));
        }
        if self.opts.debug {
            self.emit_debug_print(rd, false);
        }

        self.release_scratch(sa);
        self.release_scratch(sb);
        self.release_scratch(sd);
        Ok(())
    }

    /// Builds a 0/1 boolean in `rd` from `cp ra, rb`.
    ///
    /// `==`, `!=`, `<` and `>=` have a direct branch; `>` and `<=` combine
    /// `brlo` and `breq`, which keeps the sequences correct for unsigned
    /// 8-bit values.
    fn emit_relational(&mut self, op: TacOp, ra: u8, rb: u8, rd: u8) {
        let k = self.cmp_counter;
        self.cmp_counter += 1;

        match op {
            TacOp::Eq | TacOp::Ne | TacOp::Lt | TacOp::Ge => {
                let branch = match op {
                    TacOp::Eq => "breq",
                    TacOp::Ne => "brne",
                    TacOp::Lt => "brlo",
                    TacOp::Ge => "brsh",
                    _ => unreachable!(),
                };
                self.instr(format!("cp r{}, r{}", ra, rb));
                self.instr(format!("{} cmp_true_{}", branch, k));
                self.instr(format!("ldi r{}, 0", rd));
                self.instr(format!("rjmp cmp_end_{}", k));
                self.line(format!("cmp_true_{}:", k));
                self.instr(format!("ldi r{}, 1", rd));
                self.line(format!("cmp_end_{}:", k));
            },
            TacOp::Gt => {
                self.instr(format!("ldi r{}, 0", rd));
                self.instr(format!("cp r{}, r{}", ra, rb));
                self.instr(format!("brlo cmp_end_{}", k));
                self.instr(format!("breq cmp_end_{}", k));
                self.instr(format!("ldi r{}, 1", rd));
                self.line(format!("cmp_end_{}:", k));
            },
            TacOp::Le => {
                self.instr(format!("ldi r{}, 1", rd));
                self.instr(format!("cp r{}, r{}", ra, rb));
                self.instr(format!("brlo cmp_end_{}", k));
                self.instr(format!("breq cmp_end_{}", k));
                self.instr(format!("ldi r{}, 0", rd));
                self.line(format!("cmp_end_{}:", k));
            },
            _ => unreachable!("{:?} is not relational", op),
        }
    }

    fn emit_if_false(&mut self, cond: &str, label: &str) -> Result<(), CodegenError> {
        if is_const(cond) {
            let value = const_value(cond).unwrap_or(0.0);
            if value == 0.0 {
                self.instr(format!("rjmp {}    ; condition is constant false", label));
            } else {
                self.instr("; condition is constant true, fall through");
            }
            return Ok(());
        }
        let (rc, scratch) = self.operand_reg(cond, "_temp_load")?;
        self.instr(format!("tst r{}", rc));
        self.instr(format!("breq {}", label));
        self.release_scratch(scratch);
        Ok(())
    }

    // =========================================================================
    // OPERAND HANDLING
    // =========================================================================

    /// Materializes an operand into a register. Literals and named
    /// memories borrow a scratch register that the caller releases.
    fn operand_reg(
        &mut self,
        operand: &str,
        scratch: &'static str,
    ) -> Result<(u8, Option<&'static str>), CodegenError> {
        if is_const(operand) {
            let r = self.regs.alloc(scratch)?;
            self.instr(format!("ldi r{}, {}", r, byte_value(operand)));
            Ok((r, Some(scratch)))
        } else if is_temp(operand) {
            match self.regs.get(operand) {
                Some(r) => Ok((r, None)),
                None => Err(CodegenError::UnknownOperand(operand.to_string())),
            }
        } else {
            let r = self.regs.alloc(scratch)?;
            self.instr(format!("lds r{}, mem_{}", r, operand));
            Ok((r, Some(scratch)))
        }
    }

    /// The register a result lands in: the destination's own register for
    /// temporaries, a scratch for SRAM-bound named memories.
    fn dest_reg(&mut self, dst: &str) -> Result<(u8, Option<&'static str>), CodegenError> {
        if is_temp(dst) {
            Ok((self.regs.alloc(dst)?, None))
        } else {
            Ok((self.regs.alloc("_temp_result")?, Some("_temp_result")))
        }
    }

    fn release_scratch(&mut self, scratch: Option<&'static str>) {
        if let Some(name) = scratch {
            self.regs.release(name);
        }
    }

    /// Prints the value of `reg` over the UART without disturbing it.
    fn emit_debug_print(&mut self, reg: u8, newline: bool) {
        if reg == 16 {
            self.instr("call print_number");
        } else {
            self.instr("push r16");
            self.instr(format!("mov r16, r{}", reg));
            self.instr("call print_number");
            self.instr("pop r16");
        }
        self.instr(if newline {
            "call print_newline"
        } else {
            "call print_space"
        });
    }
}

/// Whether a TAC operand is a user memory name.
fn is_named(operand: &str) -> bool {
    !is_temp(operand) && !is_const(operand)
}

/// Truncates a literal to the 8-bit machine byte.
fn byte_value(literal: &str) -> u8 {
    let value = const_value(literal).unwrap_or(0.0).trunc() as i64;
    (value & 0xff) as u8
}
