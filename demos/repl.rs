use arithxp::evaluator::{self, Environment};
use arithxp::sexpr::parse_program;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("arithxp S-Expression Arithmetic Evaluator");
    println!("Enter expressions like: (+ 3 (* 2 2) 4)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let env = evaluator::create_global_env();

    loop {
        match rl.readline("arithxp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                // Handle special commands
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                // Parse and evaluate the whole line as a program
                match parse_program(line) {
                    Ok(None) => {}
                    Ok(Some(program)) => match evaluator::eval_program(&program, &env) {
                        Ok(value) => println!("{value}"),
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Mini S-expression arithmetic interpreter:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Supported syntax:");
    println!("  Numbers: 42, -5, -34.4");
    println!("  Operators: +, -, *, /");
    println!("  Applications: (+ 1 2), (+ 3 (* 2 2) 4)");
    println!();
    println!("Single-operand applications fold against the operator's seed:");
    println!("  (- 5)  => -5");
    println!("  (/ 5)  => 0.2");
    println!();
}

fn print_environment(env: &Environment) {
    let symbols = env.defined_symbols();

    if symbols.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", symbols.len());
    for name in symbols {
        println!("  {name}");
    }
}
