extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::Write;
use std::path::Path;

use assembler::lexer::SourceLine;
use assembler::{AsmError, Assembly, Config};

const DEFAULT_INPUT: &str = "inst.asm";
const DEFAULT_OUTPUT: &str = "program.hex";

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    let config = if args.is_present("strict") {
        Config::strict()
    } else {
        Config::default()
    };

    debug!("Arguments:\n\tVerbosity: {}\n\tConfig: {:?}\n\tOutfile: {}\n\tInfile: {}",
        verbosity_filter(args.occurrences_of("verbose")),
        config,
        args.value_of("output").unwrap_or(DEFAULT_OUTPUT),
        args.value_of("INPUT").unwrap_or(DEFAULT_INPUT)
    );

    let ipath = Path::new(args.value_of("INPUT").unwrap_or(DEFAULT_INPUT));

    let lines = match load(ipath) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(lines) => lines,
    };

    println!("Assembling {}...", ipath.display());
    let assembly = assembler::Parser::new(config).run(&lines);

    if args.is_present("print-debug") {
        print_listing(&assembly, &lines);
    }

    let opath = Path::new(args.value_of("output").unwrap_or(DEFAULT_OUTPUT));

    let mut ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    if let Err(err) = ofile.write_all(assembly.to_hex().as_bytes()) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }

    info!("{} warning(s), {} error(s)",
        assembly.count(log::Level::Warn),
        assembly.count(log::Level::Error));
    println!("Success! Output saved to {}", opath.display());
    println!("Total instructions: {}", assembly.words.len());
}

/// Reads the source file into numbered lines.
fn load(path: &Path) -> Result<Vec<SourceLine>, AsmError> {
    let display = || path.display().to_string();

    // Open the path in read-only mode, returns `io::Result<File>`
    let file = File::open(path)
        .map_err(|source| AsmError::InputNotFound { path: display(), source })?;

    assembler::lexer::read_lines(Box::new(file))
        .map_err(|source| AsmError::ReadInput { path: display(), source })
}

/// Prints every encoded word next to the line it came from.
fn print_listing(assembly: &Assembly, lines: &[SourceLine]) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for entry in assembly.words.iter() {
        let source = lines
            .get(entry.line)
            .map(|l| l.text.trim().to_owned())
            .unwrap_or_default();
        grid.add(Cell::from(format!("0x{:03X}:", entry.address)));
        grid.add(Cell::from(source));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(format!("{:04X}", entry.word)));
        grid.add(Cell::from(format!("{}", entry.instruction)));
    }

    println!("{}", grid.fit_into_columns(5));

    for (name, address) in assembly.labels.sorted() {
        println!("{:>16}: 0x{:03X}", name, address);
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("tsasm"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("0.0.0"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .default_value(DEFAULT_INPUT)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile (default: program.hex)"))
        .arg(Arg::with_name("strict")
            .long("strict")
            .takes_value(false)
            .help("reject malformed registers and unresolved labels instead of encoding them as 0, and encode JPR/JRL/LHI operands"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .long("show")
            .alias("s")
            .takes_value(false)
            .help("prints the debug information alongside the assembly to STDOUT"))
        .get_matches()
}

fn verbosity_filter(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity_filter(verbosity))
        .chain(std::io::stdout())
        .apply().ok();
}
