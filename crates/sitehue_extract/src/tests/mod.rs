mod assembler;
mod support;
