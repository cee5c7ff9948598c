// Built-in RV32I check tables

/// RV32I base instruction set, one check per instruction
pub const INSTRUCTIONS: &[(&str, &str)] = &[
    // Arithmetic
    ("add", "R-type arithmetic"),
    ("sub", "R-type arithmetic"),
    ("addi", "I-type arithmetic"),
    ("lui", "U-type load upper immediate"),
    ("auipc", "U-type add upper immediate to PC"),
    // Logical
    ("and", "R-type logical"),
    ("or", "R-type logical"),
    ("xor", "R-type logical"),
    ("andi", "I-type logical"),
    ("ori", "I-type logical"),
    ("xori", "I-type logical"),
    // Shifts
    ("sll", "R-type shift left logical"),
    ("srl", "R-type shift right logical"),
    ("sra", "R-type shift right arithmetic"),
    ("slli", "I-type shift left logical immediate"),
    ("srli", "I-type shift right logical immediate"),
    ("srai", "I-type shift right arithmetic immediate"),
    // Compare
    ("slt", "R-type set less than"),
    ("sltu", "R-type set less than unsigned"),
    ("slti", "I-type set less than immediate"),
    ("sltiu", "I-type set less than immediate unsigned"),
    // Memory
    ("lb", "I-type load byte"),
    ("lh", "I-type load halfword"),
    ("lw", "I-type load word"),
    ("lbu", "I-type load byte unsigned"),
    ("lhu", "I-type load halfword unsigned"),
    ("sb", "S-type store byte"),
    ("sh", "S-type store halfword"),
    ("sw", "S-type store word"),
    // Branches
    ("beq", "B-type branch equal"),
    ("bne", "B-type branch not equal"),
    ("blt", "B-type branch less than"),
    ("bge", "B-type branch greater equal"),
    ("bltu", "B-type branch less than unsigned"),
    ("bgeu", "B-type branch greater equal unsigned"),
    // Jumps
    ("jal", "J-type jump and link"),
    ("jalr", "I-type jump and link register"),
];

/// Core-wide properties checked against the whole design
pub const SYSTEM_CHECKS: &[(&str, &str)] = &[
    ("reg", "Register file verification"),
    ("pc_fwd", "PC forward progression verification"),
    ("pc_bwd", "PC backward verification"),
    ("dmem", "Data memory consistency"),
    ("imem", "Instruction memory consistency"),
    ("insn", "General instruction verification"),
    ("ill", "Illegal instruction handling"),
    ("hang", "Hang detection"),
    ("causal", "Causality verification"),
    ("unique", "Unique instruction verification"),
    ("liveness", "Liveness verification"),
];

/// Coverage and full-ISA integration runs
pub const INTEGRATION_CHECKS: &[(&str, &str)] = &[
    ("rv32i", "Complete RV32I ISA verification"),
    ("cover", "Coverage analysis"),
    ("fault", "Fault injection testing"),
];
