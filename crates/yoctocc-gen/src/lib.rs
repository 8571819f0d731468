//! yoctocc-gen - x86-64 code generation.
//!
//! A single pass over the typed program chain produces GNU-assembler
//! Intel-syntax text. Expressions are lowered with a stack-machine
//! strategy: every expression leaves its value in RAX, and binary
//! operators evaluate the right operand first, push it, evaluate the
//! left operand, then pop the right side into RDI.
//!
//! [`asm`] holds the stateless text primitives (registers, opcodes,
//! directives, addresses); [`generate`] is the walker.

pub mod asm;
mod codegen;

pub use codegen::generate;
