//! # Command Line Interface for the Navigation Binary

use std::collections::BTreeMap;
use std::fmt;
use std::io::Error as IOError;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_authors, crate_name, crate_version, Args, Parser, Subcommand, ValueEnum};
use cpu_time::ProcessTime;
use nautica_core::{
    NautilusOptions, ObjectivePoint, Preference, ReachableBounds, SolverResults, Stats,
    StepResponse, WriteNavLog,
};
use termcolor::{Buffer, BufferWriter, Color, ColorSpec, WriteColor};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: MethodCommand,
}

#[derive(Subcommand)]
enum MethodCommand {
    /// NAUTILUS Navigator - reference-point navigation with a free step count
    Navigator {
        #[command(flatten)]
        shared: SharedArgs,
        /// The reference point to steer towards, e.g. `f1=2.5,f2=3`
        #[arg(long, value_parser = parse_point)]
        reference: ObjectivePoint,
        /// The number of navigation steps to take
        #[arg(long, default_value_t = 5)]
        steps: usize,
        /// After the walk, step back to this step number and navigate the
        /// remaining steps again, branching the history
        #[arg(long)]
        go_back: Option<usize>,
        /// The reference point for the re-navigation after stepping back;
        /// defaults to the original one
        #[arg(long, value_parser = parse_point, requires = "go_back")]
        second_reference: Option<ObjectivePoint>,
    },
    /// Classic NAUTILUS - a fixed budget of iterations set up front
    Nautilus {
        #[command(flatten)]
        shared: SharedArgs,
        /// The reference point to steer towards, e.g. `f1=2.5,f2=3`
        #[arg(long, value_parser = parse_point)]
        reference: ObjectivePoint,
        #[command(flatten)]
        opts: NautilusOptions,
    },
    /// NAUTILUS 1 - navigation on importance ranks or percentages
    Nautilus1 {
        #[command(flatten)]
        shared: SharedArgs,
        /// Importance ranks per objective, 1 being the most important, e.g.
        /// `f1=1,f2=2`
        #[arg(
            long,
            value_parser = parse_ranks,
            required_unless_present = "percentages",
            conflicts_with = "percentages"
        )]
        ranks: Option<BTreeMap<String, u32>>,
        /// Improvement shares per objective summing to 100, e.g.
        /// `f1=75,f2=25`
        #[arg(long, value_parser = parse_point)]
        percentages: Option<ObjectivePoint>,
        /// The number of navigation steps to take
        #[arg(long, default_value_t = 5)]
        steps: usize,
    },
    /// NAUTILI - group navigation on per-decision-maker reference points
    Nautili {
        #[command(flatten)]
        shared: SharedArgs,
        /// A decision maker and their reference point, e.g.
        /// `anna:f1=2,f2=3`; repeat the option for every decision maker
        #[arg(long = "dm", value_parser = parse_dm, required = true)]
        dms: Vec<(String, ObjectivePoint)>,
        /// The number of navigation steps to take
        #[arg(long, default_value_t = 5)]
        steps: usize,
    },
}

#[derive(Args)]
struct SharedArgs {
    #[command(flatten)]
    file: FileArgs,
    #[command(flatten)]
    log: LogArgs,
}

#[derive(Args)]
struct FileArgs {
    /// The path to the JSON problem file to load
    problem_path: PathBuf,
    /// Write the full navigation history as JSON to this path
    #[arg(long)]
    history_out: Option<PathBuf>,
}

#[derive(Args)]
struct LogArgs {
    /// When to use terminal colors
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,
    /// Print the navigation configuration
    #[arg(long)]
    print_config: bool,
    /// Don't print statistics
    #[arg(long)]
    no_print_stats: bool,
    /// Verbosity of the output
    #[arg(short, long, default_value_t = 0)]
    verbosity: u8,
    /// Log steps as they are taken
    #[arg(long)]
    log_steps: bool,
    /// Log every solved sub-problem
    #[arg(long)]
    log_subproblems: bool,
    /// Log reachable bounds as they are computed
    #[arg(long)]
    log_bounds: bool,
    /// Log routine starts and ends till a given depth
    #[arg(long, default_value_t = 0)]
    log_routines: usize,
}

impl From<&LogArgs> for LoggerConfig {
    fn from(args: &LogArgs) -> Self {
        LoggerConfig {
            log_steps: args.log_steps || args.verbosity >= 1,
            log_bounds: args.log_bounds || args.verbosity >= 2,
            log_subproblems: args.log_subproblems || args.verbosity >= 3,
            log_routines: std::cmp::max(args.log_routines, args.verbosity as usize * 2),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ColorWhen {
    /// Color output when writing to a terminal
    Auto,
    /// Always color output
    Always,
    /// Never color output
    Never,
}

impl fmt::Display for ColorWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorWhen::Auto => write!(f, "auto"),
            ColorWhen::Always => write!(f, "always"),
            ColorWhen::Never => write!(f, "never"),
        }
    }
}

fn parse_point(arg: &str) -> Result<ObjectivePoint, String> {
    arg.split(',')
        .map(|entry| {
            let (symbol, value) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected `symbol=value`, got `{entry}`"))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("invalid value `{value}` for `{symbol}`"))?;
            Ok((String::from(symbol.trim()), value))
        })
        .collect()
}

fn parse_ranks(arg: &str) -> Result<BTreeMap<String, u32>, String> {
    arg.split(',')
        .map(|entry| {
            let (symbol, rank) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected `symbol=rank`, got `{entry}`"))?;
            let rank: u32 = rank
                .trim()
                .parse()
                .map_err(|_| format!("invalid rank `{rank}` for `{symbol}`"))?;
            Ok((String::from(symbol.trim()), rank))
        })
        .collect()
}

fn parse_dm(arg: &str) -> Result<(String, ObjectivePoint), String> {
    let (dm, point) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected `maker:point`, got `{arg}`"))?;
    Ok((String::from(dm.trim()), parse_point(point)?))
}

pub struct Cli {
    pub problem_path: PathBuf,
    pub history_out: Option<PathBuf>,
    stdout: BufferWriter,
    stderr: BufferWriter,
    print_config: bool,
    print_stats: bool,
    color: ColorWhen,
    logger_config: LoggerConfig,
    pub method: Method,
}

pub enum Method {
    Navigator {
        preference: Preference,
        steps: usize,
        go_back: Option<usize>,
        second_preference: Option<Preference>,
    },
    Nautilus {
        preference: Preference,
        opts: NautilusOptions,
    },
    Nautilus1 {
        preference: Preference,
        steps: usize,
    },
    Nautili {
        preference: Preference,
        makers: Vec<String>,
        steps: usize,
    },
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Navigator { .. } => write!(f, "navigator"),
            Method::Nautilus { .. } => write!(f, "nautilus"),
            Method::Nautilus1 { .. } => write!(f, "nautilus-1"),
            Method::Nautili { .. } => write!(f, "nautili"),
        }
    }
}

impl Cli {
    pub fn init() -> Self {
        let writer = |choice: ColorWhen, terminal: bool| match choice {
            ColorWhen::Always => termcolor::ColorChoice::Always,
            ColorWhen::Never => termcolor::ColorChoice::Never,
            ColorWhen::Auto => {
                if terminal {
                    termcolor::ColorChoice::Auto
                } else {
                    termcolor::ColorChoice::Never
                }
            }
        };
        let build = |shared: SharedArgs, method: Method| Cli {
            problem_path: shared.file.problem_path,
            history_out: shared.file.history_out,
            stdout: BufferWriter::stdout(writer(
                shared.log.color,
                std::io::stdout().is_terminal(),
            )),
            stderr: BufferWriter::stderr(writer(
                shared.log.color,
                std::io::stderr().is_terminal(),
            )),
            print_config: shared.log.print_config,
            print_stats: !shared.log.no_print_stats,
            color: shared.log.color,
            logger_config: (&shared.log).into(),
            method,
        };
        match CliArgs::parse().command {
            MethodCommand::Navigator {
                shared,
                reference,
                steps,
                go_back,
                second_reference,
            } => build(
                shared,
                Method::Navigator {
                    preference: Preference::ReferencePoint { point: reference },
                    steps,
                    go_back,
                    second_preference: second_reference
                        .map(|point| Preference::ReferencePoint { point }),
                },
            ),
            MethodCommand::Nautilus {
                shared,
                reference,
                opts,
            } => build(
                shared,
                Method::Nautilus {
                    preference: Preference::ReferencePoint { point: reference },
                    opts,
                },
            ),
            MethodCommand::Nautilus1 {
                shared,
                ranks,
                percentages,
                steps,
            } => {
                let preference = match (ranks, percentages) {
                    (Some(ranks), None) => Preference::Ranks { ranks },
                    (None, Some(percentages)) => Preference::Percentages { percentages },
                    // clap enforces exactly one
                    _ => unreachable!(),
                };
                build(shared, Method::Nautilus1 { preference, steps })
            }
            MethodCommand::Nautili { shared, dms, steps } => {
                let makers = dms.iter().map(|(dm, _)| dm.clone()).collect();
                let preference = Preference::Group(nautica_core::GroupPreference {
                    reference_points: dms.into_iter().collect(),
                    ..Default::default()
                });
                build(
                    shared,
                    Method::Nautili {
                        preference,
                        makers,
                        steps,
                    },
                )
            }
        }
    }

    pub fn new_cli_logger(&self) -> CliLogger {
        CliLogger {
            stdout: BufferWriter::stdout(match self.color {
                ColorWhen::Always => termcolor::ColorChoice::Always,
                ColorWhen::Never => termcolor::ColorChoice::Never,
                ColorWhen::Auto => {
                    if std::io::stdout().is_terminal() {
                        termcolor::ColorChoice::Auto
                    } else {
                        termcolor::ColorChoice::Never
                    }
                }
            }),
            config: self.logger_config.clone(),
            routine_stack: vec![],
        }
    }

    pub fn warning(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stderr.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Yellow)))?;
        write!(buffer, "warning")?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        write!(buffer, ": ")?;
        buffer.reset()?;
        writeln!(buffer, "{}", msg)?;
        self.stderr.print(&buffer)?;
        Ok(())
    }

    pub fn error(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stderr.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Red)))?;
        write!(buffer, "error")?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        write!(buffer, ": ")?;
        buffer.reset()?;
        writeln!(buffer, "{}", msg)?;
        self.stderr.print(&buffer)?;
        Ok(())
    }

    pub fn info(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stdout.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Blue)))?;
        write!(buffer, "info")?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        write!(buffer, ": ")?;
        buffer.reset()?;
        writeln!(buffer, "{}", msg)?;
        self.stdout.print(&buffer)?;
        Ok(())
    }

    pub fn print_header(&self) -> Result<(), IOError> {
        let mut buffer = self.stdout.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Green)))?;
        write!(buffer, "{}", crate_name!())?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(buffer, " ({})", crate_version!())?;
        buffer.reset()?;
        writeln!(buffer, "{}", crate_authors!("\n"))?;
        write!(buffer, "method: ")?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(buffer, "{}", self.method)?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        write!(buffer, "==============================")?;
        buffer.reset()?;
        writeln!(buffer)?;
        self.stdout.print(&buffer)?;
        Ok(())
    }

    pub fn print_config(&self) -> Result<(), IOError> {
        if self.print_config {
            let mut buffer = self.stdout.buffer();
            Self::start_block(&mut buffer)?;
            buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Blue)))?;
            write!(buffer, "Navigation Config")?;
            buffer.reset()?;
            buffer.set_color(ColorSpec::new().set_bold(true))?;
            writeln!(buffer, ": ")?;
            buffer.reset()?;
            Self::print_parameter(&mut buffer, "method", &self.method)?;
            match &self.method {
                Method::Navigator {
                    preference,
                    steps,
                    go_back,
                    ..
                } => {
                    Self::print_parameter(&mut buffer, "preference", preference.kind())?;
                    Self::print_parameter(&mut buffer, "steps", steps)?;
                    if let Some(back) = go_back {
                        Self::print_parameter(&mut buffer, "go-back", back)?;
                    }
                }
                Method::Nautilus1 { preference, steps } => {
                    Self::print_parameter(&mut buffer, "preference", preference.kind())?;
                    Self::print_parameter(&mut buffer, "steps", steps)?;
                }
                Method::Nautilus { preference, opts } => {
                    Self::print_parameter(&mut buffer, "preference", preference.kind())?;
                    Self::print_parameter(&mut buffer, "total-steps", opts.total_steps)?;
                }
                Method::Nautili {
                    preference,
                    makers,
                    steps,
                } => {
                    Self::print_parameter(&mut buffer, "preference", preference.kind())?;
                    Self::print_parameter(&mut buffer, "decision-makers", makers.join(", "))?;
                    Self::print_parameter(&mut buffer, "steps", steps)?;
                }
            }
            Self::end_block(&mut buffer)?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    pub fn print_history(&self, history: &[StepResponse]) -> Result<(), IOError> {
        let mut buffer = self.stdout.buffer();
        Self::start_block(&mut buffer)?;
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Blue)))?;
        write!(buffer, "Navigation History")?;
        buffer.reset()?;
        buffer.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(buffer, ": ")?;
        buffer.reset()?;
        for response in history {
            Self::print_step(&mut buffer, response)?;
        }
        Self::end_block(&mut buffer)?;
        self.stdout.print(&buffer)?;
        Ok(())
    }

    pub fn print_stats(&self, stats: Stats) -> Result<(), IOError> {
        if self.print_stats {
            let mut buffer = self.stdout.buffer();
            Self::start_block(&mut buffer)?;
            buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Blue)))?;
            write!(buffer, "Navigation Stats")?;
            buffer.reset()?;
            buffer.set_color(ColorSpec::new().set_bold(true))?;
            writeln!(buffer, ": ")?;
            buffer.reset()?;
            Self::print_parameter(&mut buffer, "n-steps", stats.n_steps)?;
            Self::print_parameter(&mut buffer, "n-subproblem-calls", stats.n_subproblem_calls)?;
            Self::print_parameter(
                &mut buffer,
                "n-bounds-computations",
                stats.n_bounds_computations,
            )?;
            Self::print_parameter(&mut buffer, "n-projections", stats.n_projections)?;
            Self::print_parameter(&mut buffer, "n-objectives", stats.n_objs)?;
            Self::end_block(&mut buffer)?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn print_step(buffer: &mut Buffer, response: &StepResponse) -> Result<(), IOError> {
        Self::start_block(buffer)?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(buffer, "Step")?;
        buffer.reset()?;
        writeln!(buffer, " #{}", response.step_number)?;
        Self::print_parameter(
            buffer,
            "navigation-point",
            PointPrinter::new(&response.navigation_point),
        )?;
        if let Some(solution) = &response.reachable_solution {
            Self::print_parameter(buffer, "reachable-solution", PointPrinter::new(solution))?;
        }
        Self::print_parameter(
            buffer,
            "lower-bounds",
            PointPrinter::new(&response.reachable_bounds.lower_bounds),
        )?;
        Self::print_parameter(
            buffer,
            "upper-bounds",
            PointPrinter::new(&response.reachable_bounds.upper_bounds),
        )?;
        Self::print_parameter(
            buffer,
            "distance-to-front",
            format_args!("{:.2}%", response.distance_to_front),
        )?;
        Self::end_block(buffer)?;
        Ok(())
    }

    fn print_parameter<V: fmt::Display>(
        buffer: &mut Buffer,
        name: &str,
        val: V,
    ) -> Result<(), IOError> {
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(buffer, "{}", name)?;
        buffer.reset()?;
        writeln!(buffer, ": {}", val)?;
        Ok(())
    }

    fn start_block(buffer: &mut Buffer) -> Result<(), IOError> {
        buffer.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(buffer, ">>>>>")?;
        buffer.reset()?;
        writeln!(buffer)?;
        Ok(())
    }

    fn end_block(buffer: &mut Buffer) -> Result<(), IOError> {
        buffer.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(buffer, "<<<<<")?;
        buffer.reset()?;
        writeln!(buffer)?;
        Ok(())
    }
}

#[derive(Clone)]
struct LoggerConfig {
    log_steps: bool,
    log_bounds: bool,
    log_subproblems: bool,
    log_routines: usize,
}

pub struct CliLogger {
    stdout: BufferWriter,
    config: LoggerConfig,
    routine_stack: Vec<(&'static str, ProcessTime)>,
}

impl WriteNavLog for CliLogger {
    fn log_subproblem(&mut self, target: &str, results: &SolverResults) -> anyhow::Result<()> {
        if self.config.log_subproblems {
            let mut buffer = self.stdout.buffer();
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(buffer, "sub-problem")?;
            buffer.reset()?;
            writeln!(
                buffer,
                ": target: {}; result: {}; cpu-time: {}",
                target,
                results.message,
                DurPrinter::new(ProcessTime::now().as_duration()),
            )?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn log_bounds(&mut self, bounds: &ReachableBounds) -> anyhow::Result<()> {
        if self.config.log_bounds {
            let mut buffer = self.stdout.buffer();
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            write!(buffer, "reachable bounds")?;
            buffer.reset()?;
            writeln!(
                buffer,
                ": lower: {}; upper: {}",
                PointPrinter::new(&bounds.lower_bounds),
                PointPrinter::new(&bounds.upper_bounds),
            )?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn log_step(&mut self, response: &StepResponse) -> anyhow::Result<()> {
        if self.config.log_steps {
            let mut buffer = self.stdout.buffer();
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(buffer, "step")?;
            buffer.reset()?;
            writeln!(
                buffer,
                ": #{}; navigation-point: {}; distance: {:.2}%; cpu-time: {}",
                response.step_number,
                PointPrinter::new(&response.navigation_point),
                response.distance_to_front,
                DurPrinter::new(ProcessTime::now().as_duration()),
            )?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn log_routine_start(&mut self, desc: &'static str) -> anyhow::Result<()> {
        self.routine_stack.push((desc, ProcessTime::now()));

        if self.config.log_routines >= self.routine_stack.len() {
            let mut buffer = self.stdout.buffer();
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(buffer, ">>> routine start")?;
            buffer.reset()?;
            writeln!(buffer, ": {}", desc)?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn log_routine_end(&mut self) -> anyhow::Result<()> {
        let (desc, start) = self.routine_stack.pop().expect("routine stack out of sync");

        if self.config.log_routines > self.routine_stack.len() {
            let duration = ProcessTime::now().duration_since(start);

            let mut buffer = self.stdout.buffer();
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(buffer, "<<< routine end")?;
            buffer.reset()?;
            writeln!(buffer, ": {}; duration: {}", desc, DurPrinter::new(duration))?;
            self.stdout.print(&buffer)?;
        }
        Ok(())
    }

    fn log_message(&mut self, msg: &str) -> anyhow::Result<()> {
        let mut buffer = self.stdout.buffer();
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(buffer, "message")?;
        buffer.reset()?;
        writeln!(buffer, ": {}", msg)?;
        self.stdout.print(&buffer)?;
        Ok(())
    }
}

struct PointPrinter<'p> {
    point: &'p ObjectivePoint,
}

impl<'p> PointPrinter<'p> {
    fn new(point: &'p ObjectivePoint) -> Self {
        PointPrinter { point }
    }
}

impl fmt::Display for PointPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for (symbol, value) in self.point {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}={}", symbol, value)?;
        }
        write!(f, ")")
    }
}

struct DurPrinter {
    dur: Duration,
}

impl DurPrinter {
    fn new(dur: Duration) -> Self {
        DurPrinter { dur }
    }
}

impl fmt::Display for DurPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.dur.as_secs_f64())
    }
}
