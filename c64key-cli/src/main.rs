mod file;
mod render;
mod watch;

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use c64key_core::{
    layouts, Decoder, Layout, MatrixSnapshot, RemoteWakeup, ShiftRule, SuspendMonitor, COLS,
    ROWS,
};
use clap::{Parser, Subcommand};

use file::LayoutFile;

#[derive(Parser)]
#[command(name = "c64key")]
#[command(about = "Commodore keyboard USB adapter tool")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the bundled layouts
    Layouts,
    /// Validate a bundled layout or a JSON layout file
    Check {
        /// Bundled layout name
        #[arg(long, conflicts_with = "file")]
        layout: Option<String>,
        /// Path to a JSON layout file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Decode a set of held keys into the report the adapter would send
    Decode {
        #[arg(long, default_value = "c64-us")]
        layout: String,
        /// Held matrix cell as ROW,COL (repeatable; row 8 is RESTORE)
        #[arg(long = "press", value_parser = parse_cell)]
        press: Vec<(usize, usize)>,
        /// Pretend the host has suspended the bus
        #[arg(long)]
        suspended: bool,
    },
    /// Render a layout's matrix as HTML/SVG
    Render {
        #[arg(long, default_value = "c64-us")]
        layout: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print reports from a connected adapter
    Watch {
        /// Stop after this many reports
        #[arg(long)]
        count: Option<usize>,
    },
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Parse `ROW,COL` into a matrix position.
fn parse_cell(s: &str) -> Result<(usize, usize)> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("expected ROW,COL, got {s:?}"))?;
    let row: usize = row.trim().parse().with_context(|| format!("bad row {row:?}"))?;
    let col: usize = col.trim().parse().with_context(|| format!("bad column {col:?}"))?;
    if row >= ROWS || col >= COLS {
        bail!("cell ({row}, {col}) is outside the {ROWS}x{COLS} matrix");
    }
    Ok((row, col))
}

fn builtin(name: &str) -> Result<Layout<'static>> {
    let def = layouts::by_name(name).ok_or_else(|| {
        let known: Vec<&str> = layouts::ALL.iter().map(|def| def.name).collect();
        anyhow!("unknown layout {name:?} (known: {})", known.join(", "))
    })?;
    Layout::new(def.clone()).with_context(|| format!("layout {name}"))
}

fn describe_rule(rule: &ShiftRule) -> String {
    match *rule {
        ShiftRule::BothReleased { left, right } => format!(
            "shift at ({}, {}) and ({}, {})",
            left.row, left.col, right.row, right.col
        ),
        ShiftRule::LeftOnly { left } => format!("left shift only at ({}, {})", left.row, left.col),
        ShiftRule::RightIgnoredFrom { left, right, from } => format!(
            "shift at ({}, {}) and ({}, {}), right ignored from special {from}",
            left.row, left.col, right.row, right.col
        ),
    }
}

fn summarize(layout: &Layout<'_>) {
    let used = layout
        .keys()
        .iter()
        .flatten()
        .filter(|key| **key != c64key_core::Key::None)
        .count();
    println!(
        "{}: {used} keys, {} special keys, {}",
        layout.name(),
        layout.specials().len(),
        describe_rule(layout.shift_rule())
    );
}

/// Stands in for the bus when decoding offline.
struct PrintWakeup;

impl RemoteWakeup for PrintWakeup {
    fn remote_wakeup(&mut self) {
        println!("Remote wakeup pulse sent");
    }
}

fn decode(layout: &Layout<'_>, press: &[(usize, usize)], suspended: bool) {
    let mut snapshot = MatrixSnapshot::released();
    for &(row, col) in press {
        snapshot.press(row, col);
    }

    let mut monitor = SuspendMonitor::new();
    if suspended {
        monitor.elapse(u8::MAX);
        monitor.update(false);
    }

    let decoded = Decoder::new(layout).decode(&snapshot, &mut monitor, &mut PrintWakeup);
    let built = decoded.build();

    println!("{}", watch::describe(&built.report));
    if built.rolled_over {
        println!("More than six keys held: roll-over report");
    }
    if suspended && !decoded.woke_host {
        println!("No key held, host stays suspended");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Layouts => {
            for def in layouts::ALL {
                let layout = Layout::new(def.clone())
                    .with_context(|| format!("bundled layout {}", def.name))?;
                summarize(&layout);
            }
        }
        Command::Check { layout, file } => match (layout, file) {
            (_, Some(path)) => {
                let file = LayoutFile::load(&path)?;
                summarize(&file.layout()?);
                println!("OK");
            }
            (name, None) => {
                let name = name.as_deref().unwrap_or("c64-us");
                summarize(&builtin(name)?);
                println!("OK");
            }
        },
        Command::Decode {
            layout,
            press,
            suspended,
        } => {
            decode(&builtin(&layout)?, &press, suspended);
        }
        Command::Render { layout, output } => {
            let html = render::generate_html(&builtin(&layout)?);
            match output {
                Some(path) => {
                    fs::write(&path, html)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{html}"),
            }
        }
        Command::Watch { count } => watch::watch(count)?,
    }

    Ok(())
}
