//! bftape - run bracket programs and the associative tape automaton
//!
//! # Usage
//!
//! ```bash
//! # Run a program in raw mode, reading `,` input from stdin
//! bftape run '++++++++[>++++++++<-]>+.' --len 1
//!
//! # Generate a random program and run it in generative mode
//! bftape generate --seed 7
//!
//! # Step the tape automaton, CSV on stdout
//! bftape tape --steps 1000 --seed 3 --json run.json --brain brain.json --prime
//! ```
//!
//! Log output goes to stderr; `RUST_LOG` overrides the default `warn` level.
//!
//! # Exit Codes
//!
//! - 0: success
//! - 1: the run failed
//! - 2: invalid arguments or config

use std::io;
use std::process::ExitCode;

use bftape::report::{RunReport, write_csv};
use bftape::{Config, Interpreter, Mixer, Predictor, Program, ProgramGenerator, TapeAutomaton};
use tracing_subscriber::EnvFilter;

struct Options {
    command: String,
    program: Option<String>,
    len: usize,
    steps: u64,
    seed: Option<u64>,
    config: Option<String>,
    json: Option<String>,
    brain: Option<String>,
    prime: bool,
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("Error: {}\n", message);
            print_help();
            return ExitCode::from(2);
        }
    };

    let mut config = match &options.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load config {}: {}", path, err);
                return ExitCode::from(2);
            }
        },
        None => Config::default(),
    };
    if let Some(seed) = options.seed {
        config.automaton.seed = seed;
        config.generator.seed = seed;
        config.mixer.seed = seed;
    }

    let outcome = match options.command.as_str() {
        "run" => run_raw(&options, &config),
        "generate" => run_generate(&config),
        "tape" => run_tape(&options, &config),
        other => {
            eprintln!("Unknown command: {}\n", other);
            print_help();
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(1)
        }
    }
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options {
        command: String::new(),
        program: None,
        len: 1024,
        steps: 1024,
        seed: None,
        config: None,
        json: None,
        brain: None,
        prime: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--len" => options.len = parse_number(iter.next(), "--len")?,
            "--steps" => options.steps = parse_number(iter.next(), "--steps")?,
            "--seed" => options.seed = Some(parse_number(iter.next(), "--seed")?),
            "--config" => options.config = Some(required(iter.next(), "--config")?),
            "--json" => options.json = Some(required(iter.next(), "--json")?),
            "--brain" => options.brain = Some(required(iter.next(), "--brain")?),
            "--prime" => options.prime = true,
            _ if arg.starts_with("--") => return Err(format!("Unknown option: {}", arg)),
            _ if options.command.is_empty() => options.command = arg.clone(),
            _ if options.program.is_none() => options.program = Some(arg.clone()),
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
    }

    if options.command.is_empty() {
        return Err("No command specified".to_string());
    }
    Ok(Some(options))
}

fn required(value: Option<&String>, flag: &str) -> Result<String, String> {
    value.cloned().ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_number<T: std::str::FromStr>(value: Option<&String>, flag: &str) -> Result<T, String> {
    required(value, flag)?
        .parse()
        .map_err(|_| format!("{} needs a number", flag))
}

fn run_raw(options: &Options, config: &Config) -> bftape::Result<()> {
    let Some(source) = &options.program else {
        return Err(bftape::Error::InvalidConfig("run needs a program".to_string()));
    };
    let mut vm = Interpreter::raw(config.vm, io::stdin().lock());
    let exec = vm.run(&Program::from(source.as_str()), options.len)?;
    println!("{}", exec.output);
    eprintln!("halt: {:?} after {} cycles", exec.halt, exec.cycles);
    Ok(())
}

fn run_generate(config: &Config) -> bftape::Result<()> {
    let hypothesis = ProgramGenerator::new(config.generator)?.generate();
    let mut vm = Interpreter::generative(config.vm, config.generator.seed);
    let exec = vm.run(&hypothesis.program, hypothesis.target_len)?;
    println!("program: {}", hypothesis.program);
    println!("output:  {}", exec.output);
    eprintln!(
        "halt: {:?} after {} cycles ({} of {} symbols)",
        exec.halt, exec.cycles, exec.emitted, hypothesis.target_len
    );
    Ok(())
}

/// Loads saved weights into `mixer`. A missing file means a fresh start;
/// any other failure is an error so the file is never overwritten.
fn load_brain(mixer: &mut Mixer, path: &str) -> bftape::Result<bool> {
    match mixer.load_from_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn run_tape(options: &Options, config: &Config) -> bftape::Result<()> {
    let mut mixer = Mixer::new(config.mixer);
    if let Some(path) = &options.brain {
        if load_brain(&mut mixer, path)? {
            eprintln!("Loaded brain from {}", path);
        } else {
            eprintln!("No brain at {}, starting fresh", path);
        }
    }

    if options.prime {
        let hypothesis = ProgramGenerator::new(config.generator)?.generate();
        let mut vm = Interpreter::generative(config.vm, config.generator.seed);
        let exec = vm.run(&hypothesis.program, hypothesis.target_len)?;
        mixer.ingest_all(&exec.symbols());
        eprintln!("Primed predictor with {} symbols", exec.emitted);
    }

    let mut automaton = TapeAutomaton::new(config.automaton, mixer)?;
    let observations = automaton.run(options.steps)?;
    write_csv(io::stdout().lock(), &observations)?;

    if let Some(path) = &options.json {
        RunReport::new(config.automaton.seed, observations).save_to_file(path)?;
    }
    if let Some(path) = &options.brain {
        automaton.predictor().save_to_file(path)?;
    }
    Ok(())
}

fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn print_help() {
    eprintln!(
        r#"bftape - bracket interpreter and associative tape automaton

USAGE:
    bftape run <program> [--len N]
    bftape generate [--seed N] [--config PATH]
    bftape tape [--steps N] [--seed N] [--config PATH] [--json PATH] [--brain PATH] [--prime]

OPTIONS:
    --len N         Output length cap for `run` (default 1024)
    --steps N       Automaton steps for `tape` (default 1024)
    --seed N        Seed for pool, generator and predictor
    --config PATH   JSON config file
    --json PATH     Write a JSON run report
    --brain PATH    Load and save predictor weights
    --prime         Feed generated program output to the predictor first
    -h, --help      Show this help"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_tape_options() {
        let options = parse_args(&args(&["tape", "--steps", "10", "--seed", "4", "--prime"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.command, "tape");
        assert_eq!(options.steps, 10);
        assert_eq!(options.seed, Some(4));
        assert!(options.prime);
    }

    #[test]
    fn test_parse_run_program() {
        let options = parse_args(&args(&["run", "+++.", "--len", "1"])).unwrap().unwrap();
        assert_eq!(options.program.as_deref(), Some("+++."));
        assert_eq!(options.len, 1);
    }

    fn tape_options(brain: &str) -> Options {
        let mut options = parse_args(&args(&["tape", "--steps", "2", "--brain", brain]))
            .unwrap()
            .unwrap();
        options.seed = Some(1);
        options
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.automaton.tape_length = 16;
        config.automaton.pool_size = 8;
        config.automaton.dimension = 8;
        config.mixer.dimension = 8;
        config
    }

    #[test]
    fn test_corrupt_brain_fails_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        let corrupt = r#"[{"from": 5, "to": 6, "wei"#;
        std::fs::write(&path, corrupt).unwrap();
        let path = path.to_str().unwrap();

        let result = run_tape(&tape_options(path), &small_config());
        assert!(matches!(result, Err(bftape::Error::Io(_))));
        assert_eq!(std::fs::read_to_string(path).unwrap(), corrupt);
    }

    #[test]
    fn test_missing_brain_starts_fresh_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        let path = path.to_str().unwrap();

        let mut mixer = Mixer::new(small_config().mixer);
        assert!(!load_brain(&mut mixer, path).unwrap());

        run_tape(&tape_options(path), &small_config()).unwrap();
        assert!(load_brain(&mut mixer, path).unwrap());
    }

    #[test]
    fn test_failed_brain_save_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // Loading finds nothing and starts fresh; saving has no directory to write into.
        let path = dir.path().join("missing").join("brain.json");
        let path = path.to_str().unwrap();
        assert!(matches!(
            run_tape(&tape_options(path), &small_config()),
            Err(bftape::Error::Io(_))
        ));
    }

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(None).to_string(), "warn");
        assert_eq!(log_filter(Some("debug".to_string())).to_string(), "debug");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["tape", "--steps"])).is_err());
        assert!(parse_args(&args(&["tape", "--steps", "many"])).is_err());
        assert!(parse_args(&args(&["tape", "--bogus"])).is_err());
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
    }
}
