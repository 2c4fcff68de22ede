use std::io::empty;

use bftape::{
    ALPHABET, GeneratorConfig, Halt, Interpreter, Program, ProgramGenerator, VmConfig,
};

fn config(cycle_limit: usize) -> VmConfig {
    VmConfig {
        memory_size: 4096,
        cycle_limit,
    }
}

#[test]
fn test_documented_examples() {
    let mut vm = Interpreter::raw(VmConfig::default(), empty());

    let exec = vm.run(&Program::from("+++."), 1).unwrap();
    assert_eq!(exec.output.as_bytes(), &[0x03]);

    let exec = vm.run(&Program::from("+[-]"), 1).unwrap();
    assert_eq!(exec.halt, Halt::ProgramEnd);

    let exec = vm.run(&Program::from("[-]+++."), 1).unwrap();
    assert_eq!(exec.output.as_bytes(), &[0x03]);
}

#[test]
fn test_generated_programs_respect_limits() {
    let mut generator = ProgramGenerator::new(GeneratorConfig {
        seed: 2024,
        loop_probability: 0.3,
        ..GeneratorConfig::default()
    })
    .unwrap();
    for limit in [1usize, 17, 500, 5_000] {
        for _ in 0..25 {
            let h = generator.generate();
            let exec = Interpreter::generative(config(limit), 5)
                .run(&h.program, h.target_len)
                .unwrap();
            assert!(exec.cycles <= limit);
            assert!(exec.emitted <= h.target_len);
            assert_eq!(exec.output.chars().count(), exec.emitted);
            assert!(exec.output.chars().all(|c| ALPHABET.contains(&c)));
        }
    }
}

#[test]
fn test_output_never_exceeds_cap() {
    let program = Program::from("+[.]");
    for cap in 0..20 {
        let exec = Interpreter::raw(config(100_000), empty())
            .run(&program, cap)
            .unwrap();
        assert_eq!(exec.emitted, cap);
        assert_eq!(exec.halt, Halt::OutputCap);
    }
}

#[test]
fn test_raw_programs_without_input_never_fail_on_small_memory() {
    // Clamp addressing only fails past the end; these stay near cell 0.
    let mut vm = Interpreter::raw(config(10_000), empty());
    for source in ["<<<<+.", "+[>+<-]>.", "++[->+<]>[-<+>]<."] {
        assert!(vm.run(&Program::from(source), 4).is_ok(), "{source}");
    }
}
