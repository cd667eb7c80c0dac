use clap::{Parser, Subcommand};
use dep_inspector::core::error::InspectError;
use dep_inspector::gocmd::CancelToken;
use dep_inspector::inspect::{Inspector, InspectorOptions, validate_version};
use dep_inspector::report;
use tracing_subscriber::EnvFilter;

/// Inspect and diff the capabilities and lint findings of Go module
/// dependencies
#[derive(Parser)]
#[command(name = "dep-inspector")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Print commands being run and verbose information
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Inspect a single version of a dependency
  Inspect {
    /// Module path of the dependency
    dep: String,
    /// Version to inspect, e.g. v1.2.3
    version: String,
    /// Analyze all of the dependency's packages, not just used ones
    #[arg(long)]
    all_packages: bool,
  },

  /// Compare two versions of a dependency
  Compare {
    /// Module path of the dependency
    dep: String,
    /// Old version, e.g. v1.2.3
    old_version: String,
    /// New version, e.g. v1.3.0
    new_version: String,
    /// Analyze all of the dependency's packages, not just used ones
    #[arg(long)]
    all_packages: bool,
    /// Also compare every dependency that changed version between the
    /// two states
    #[arg(long)]
    recursive: bool,
    /// Require matching column positions when diffing lint findings
    #[arg(long)]
    match_columns: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  if let Err(err) = run(cli.command) {
    eprintln!("\n{}", err);
    std::process::exit(err.exit_code().as_i32());
  }
}

fn run(command: Commands) -> Result<(), InspectError> {
  let module_root = std::env::current_dir()?;
  let cancel = CancelToken::new();

  // Ctrl-C triggers the token; in-flight subprocesses are killed and
  // awaited before the error surfaces
  let interrupt = cancel.clone();
  ctrlc::set_handler(move || interrupt.cancel())
    .map_err(|err| InspectError::message(format!("installing interrupt handler: {}", err)))?;

  match command {
    Commands::Inspect {
      dep,
      version,
      all_packages,
    } => {
      validate_version(&version)?;
      let inspector = Inspector::new(
        &module_root,
        InspectorOptions {
          all_packages,
          match_columns: false,
        },
        cancel,
      )?;
      let findings = inspector.inspect_version(&dep, &version)?;
      report::print_inspection(&findings);
    }
    Commands::Compare {
      dep,
      old_version,
      new_version,
      all_packages,
      recursive,
      match_columns,
    } => {
      validate_version(&old_version)?;
      validate_version(&new_version)?;
      let inspector = Inspector::new(
        &module_root,
        InspectorOptions {
          all_packages,
          match_columns,
        },
        cancel,
      )?;
      if recursive {
        let result = inspector.compare_recursively(&dep, &old_version, &new_version)?;
        report::print_recursive(&result);
      } else {
        let result = inspector.compare_versions(&dep, &old_version, &new_version)?;
        report::print_comparison(&result);
      }
    }
  }

  Ok(())
}
