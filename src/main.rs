// meminspect: typed memory-state inspector for single-stepped native programs

mod demo;
mod engine;
mod errors;
mod model;
mod resolve;
mod step;
mod text;
mod ui;

use std::fs::File;
use std::io::{self, Write};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use demo::{demo_target, DEMO_ARCH, DEMO_SOURCE};
use model::MemoryModel;
use step::StepDriver;
use text::read_text_section;
use ui::App;

fn usage(program_name: &str) -> ! {
    eprintln!("Usage: {} [options]", program_name);
    eprintln!();
    eprintln!("Replays the bundled demo session and inspects its memory.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -n <steps>     number of source lines to step (default: run to exit)");
    eprintln!("  --tsv <path>   write the final memory model as TSV to <path> (default: stdout)");
    eprintln!("  --tui          inspect interactively in the terminal UI");
    eprintln!("  --verbose      enable debug logging on stderr");
    std::process::exit(1);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("meminspect");

    let mut steps: Option<usize> = None;
    let mut tsv_path: Option<String> = None;
    let mut tui = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" => {
                i += 1;
                let Some(n) = args.get(i).and_then(|s| s.parse().ok()) else {
                    eprintln!("Error: -n expects a step count");
                    usage(program_name);
                };
                steps = Some(n);
            }
            "--tsv" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("Error: --tsv expects a file path");
                    usage(program_name);
                };
                tsv_path = Some(path.clone());
            }
            "--tui" => tui = true,
            "--verbose" => verbose = true,
            other => {
                eprintln!("Error: unknown option '{}'", other);
                usage(program_name);
            }
        }
        i += 1;
    }

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("meminspect=debug")),
            )
            .with_writer(io::stderr)
            .init();
    }

    let target = demo_target();
    let mut model = MemoryModel::new();
    read_text_section(&mut model, &target);
    let mut driver = StepDriver::new(target, DEMO_ARCH);

    if tui {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut app = App::new(driver, model, DEMO_SOURCE.to_string());
        let res = app.run(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res?;
        return Ok(());
    }

    // Headless: step the requested count (or until exit) and export.
    match steps {
        Some(n) => driver.step(n, &mut model)?,
        None => {
            while !driver.has_exited() {
                driver.step(1, &mut model)?;
            }
        }
    }

    for line in &driver.execution_state().stdout {
        eprintln!("stdout: {}", line);
    }

    match tsv_path {
        Some(path) => {
            let mut file = File::create(&path)?;
            model.write_tsv(&mut file)?;
            eprintln!("Wrote {} observations to {}", model.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            model.write_tsv(&mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}
