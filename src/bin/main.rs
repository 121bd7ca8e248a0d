/// CLI tool for expanding prompt templates against a tags directory
use prompt_selector::loader::FolderTagSource;
use prompt_selector::{SelectionMode, Selector, TagSource};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  promptsel <tags-dir> [options] <template-file>   Expand a template file");
    eprintln!("  promptsel <tags-dir> [options] -                 Read template from stdin");
    eprintln!("  promptsel --help                                 Show this help message");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --mode <round_robin|random>   Selection mode (default: random)");
    eprintln!("  --seed <N>                    Seed for deterministic random output");
    eprintln!("  --steps <N>                   Number of expansions to produce (default: 1)");
    eprintln!("  --count                       Print the combination count and exit");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  promptsel ./tags prompt.txt");
    eprintln!("  promptsel ./tags --mode round_robin --steps 5 prompt.txt");
    eprintln!("  echo 'a @color@ shirt' | promptsel ./tags --seed 42 -");
}

struct Args {
    tags_dir: PathBuf,
    template: String,
    mode: SelectionMode,
    seed: Option<u64>,
    steps: usize,
    count_only: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let tags_dir = PathBuf::from(&args[1]);
    let mut mode = SelectionMode::Random;
    let mut seed = None;
    let mut steps = 1usize;
    let mut count_only = false;
    let mut template_arg = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                let value = args.get(i).ok_or("--mode requires a value")?;
                mode = value.parse()?;
            }
            "--seed" => {
                i += 1;
                let value = args.get(i).ok_or("--seed requires a value")?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|e| format!("invalid seed '{}': {}", value, e))?,
                );
            }
            "--steps" => {
                i += 1;
                let value = args.get(i).ok_or("--steps requires a value")?;
                steps = value
                    .parse::<usize>()
                    .map_err(|e| format!("invalid step count '{}': {}", value, e))?;
            }
            "--count" => count_only = true,
            other => {
                if template_arg.is_some() {
                    return Err(format!("unexpected argument '{}'", other));
                }
                template_arg = Some(other.to_string());
            }
        }
        i += 1;
    }

    let template_arg = template_arg.ok_or("missing template file argument")?;
    let template = if template_arg == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("error reading from stdin: {}", e))?;
        buffer
    } else {
        fs::read_to_string(&template_arg)
            .map_err(|e| format!("error reading file '{}': {}", template_arg, e))?
    };

    Ok(Args {
        tags_dir,
        template: template.trim_end_matches('\n').to_string(),
        mode,
        seed,
        steps,
        count_only,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = parse_args().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        process::exit(1);
    });

    let store = FolderTagSource::new(args.tags_dir)
        .load()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error loading tags: {}", e);
            process::exit(1);
        });

    let mut selector = Selector::new(store).with_mode(args.mode);

    if args.count_only {
        println!("{}", selector.count_display(&args.template));
        return;
    }

    match args.mode {
        SelectionMode::RoundRobin => {
            for _ in 0..args.steps {
                match selector.round_robin_step(&args.template) {
                    Ok(step) => {
                        eprintln!("{}", step.label);
                        println!("{}", step.text);
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        process::exit(1);
                    }
                }
            }
        }
        SelectionMode::Random => {
            for _ in 0..args.steps {
                println!("{}", selector.random_expand(&args.template, args.seed));
            }
        }
    }
}
