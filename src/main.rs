//! `goscaf`: generate Go test scaffolds for every function and method of a
//! package.
//!
//! Each declaration gets a test calling it with zero-valued arguments and
//! asserting zero-valued results, failing until a developer fills it in.

mod error;
mod extract;
mod format;
mod generate;
mod loader;
mod model;
mod output;
mod parser;
mod render;
mod resolve;
mod typeinfo;
mod types;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use error::ScaffoldError;
use generate::{generate, write_scaffold, OutputOptions};
use render::ScaffoldStyle;

#[derive(Parser, Debug)]
#[command(name = "goscaf", version, about = "Generate Go test scaffolds for a package")]
struct Cli {
    /// Directory holding the package
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Generate table-driven tests
    #[arg(long)]
    table: bool,

    /// Print the test file instead of writing it
    #[arg(long)]
    stdout: bool,

    /// Overwrite an existing test file
    #[arg(long)]
    force: bool,

    /// Skip running gofmt on the written file
    #[arg(long)]
    no_fmt: bool,

    /// Print the resolved declaration model as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn style(&self) -> ScaffoldStyle {
        if self.table {
            ScaffoldStyle::Table
        } else {
            ScaffoldStyle::Plain
        }
    }

    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            force: self.force,
            format: !self.no_fmt,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("goscaf: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ScaffoldError> {
    let generated = generate(&cli.dir, cli.style())?;

    if generated.unit.has_generics() {
        let generic: Vec<String> = generated
            .unit
            .testable()
            .filter(|d| d.has_type_params)
            .map(|d| d.display_name())
            .collect();
        tracing::warn!(
            declarations = %generic.join(", "),
            "generic declarations need their type parameters instantiated by hand"
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&generated.unit)?);
        return Ok(());
    }
    if cli.stdout {
        print!("{}", generated.file);
        return Ok(());
    }

    if let Some(path) = write_scaffold(&generated, &cli.dir, &cli.output_options())? {
        println!(
            "wrote {} ({} tests)",
            path.display(),
            generated.file.tests.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("goscaf").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_current_directory_and_plain_style() {
        let cli = parse(&[]);
        assert_eq!(cli.dir, PathBuf::from("."));
        assert_eq!(cli.style(), ScaffoldStyle::Plain);
        let opts = cli.output_options();
        assert!(!opts.force);
        assert!(opts.format);
    }

    #[test]
    fn flags_fold_into_style_and_output_options() {
        let cli = parse(&["pkg/calc", "--table", "--force", "--no-fmt"]);
        assert_eq!(cli.dir, PathBuf::from("pkg/calc"));
        assert_eq!(cli.style(), ScaffoldStyle::Table);
        let opts = cli.output_options();
        assert!(opts.force);
        assert!(!opts.format);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let result = Cli::try_parse_from(["goscaf", "--unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn json_dump_serializes_the_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("calc.go"),
            "package calc\n\nfunc Sum(xs ...int) int { return 0 }\n",
        )
        .unwrap();
        let generated = generate(dir.path(), ScaffoldStyle::Plain).unwrap();
        let json: serde_json::Value = serde_json::to_value(&generated.unit).unwrap();
        assert_eq!(json["package_name"], "calc");
        assert_eq!(json["declarations"][0]["name"], "Sum");
        assert_eq!(json["declarations"][0]["params"][0]["variadic"], true);
        assert_eq!(json["declarations"][0]["params"][0]["ty"]["kind"], "slice");
    }
}
