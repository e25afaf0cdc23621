use serde::Serialize;
use std::io::Read;
use tracing_subscriber::EnvFilter;
use yacraf::render::{
    HeadlessError, PipelineOptions, SceneRecorder, layout_document, plot_document,
};
use yacraf::{Diagnostic, build_model, validate};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Yacraf(yacraf::Error),
    Headless(HeadlessError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Yacraf(err) => write!(f, "{err}"),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<yacraf::Error> for CliError {
    fn from(value: yacraf::Error) -> Self {
        Self::Yacraf(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Validate,
    Tree,
    Layout,
    Render,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    config: Option<String>,
    log_level: Option<String>,
    out: Option<String>,
    allow_invalid: bool,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    InvalidModel,
}

#[derive(Serialize)]
struct ValidateOut<'a> {
    valid: bool,
    diagnostics: &'a [Diagnostic],
}

fn usage() -> &'static str {
    "yacraf-cli\n\
\n\
USAGE:\n\
  yacraf-cli [validate] [--pretty] [--config <path>] [--out <path>] [<path>|-]\n\
  yacraf-cli tree [--config <path>] [--out <path>] [<path>|-]\n\
  yacraf-cli layout [--pretty] [--config <path>] [--allow-invalid] [--out <path>] [<path>|-]\n\
  yacraf-cli render [--pretty] [--config <path>] [--allow-invalid] [--out <path>] [<path>|-]\n\
\n\
OPTIONS:\n\
  --log-level <filter>  tracing filter for stderr logs (default: $RUST_LOG, else `warn`)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - --config reads pipeline options (build, validation, layout) from a JSON file.\n\
  - validate prints the validation report as JSON and exits with 1 when the model is invalid.\n\
  - layout and render refuse invalid models (exit 1) unless --allow-invalid is given.\n\
  - render prints the recorded scene (views, nodes, connectors) as JSON.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "validate" => args.command = Command::Validate,
            "tree" => args.command = Command::Tree,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--allow-invalid" => args.allow_invalid = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--log-level" => {
                let Some(filter) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.log_level = Some(filter.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn read_options(path: Option<&str>) -> Result<PipelineOptions, CliError> {
    let Some(path) = path else {
        return Ok(PipelineOptions::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_text(&text, out)
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<Status, CliError> {
    let mut options = read_options(args.config.as_deref())?;
    if args.allow_invalid {
        options.abort_on_invalid = false;
    }
    let text = read_input(args.input.as_deref())?;
    let out = args.out.as_deref();

    match args.command {
        Command::Validate => {
            let model = build_model(&text, &options.build)?;
            let report = validate(&model, &options.validation);
            write_json(
                &ValidateOut {
                    valid: report.is_valid(),
                    diagnostics: &report.diagnostics,
                },
                args.pretty,
                out,
            )?;
            Ok(if report.is_valid() {
                Status::Ok
            } else {
                Status::InvalidModel
            })
        }
        Command::Tree => {
            let model = build_model(&text, &options.build)?;
            let outlines: Vec<String> = model
                .attack_trees()
                .iter()
                .map(|tree| model.outline(tree))
                .collect();
            write_text(&outlines.join("\n"), out)?;
            Ok(Status::Ok)
        }
        Command::Layout => {
            let pipeline = layout_document(&text, &options)?;
            write_json(&pipeline.layout, args.pretty, out)?;
            Ok(Status::Ok)
        }
        Command::Render => {
            let mut recorder = SceneRecorder::new();
            let outcome = plot_document(&text, &options, &mut recorder)?;
            tracing::info!(summary = ?outcome.summary, "rendered");
            write_json(recorder.scene(), args.pretty, out)?;
            Ok(Status::Ok)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    init_logging(args.log_level.as_deref());

    match run(args) {
        Ok(Status::Ok) => {}
        Ok(Status::InvalidModel) => std::process::exit(1),
        Err(CliError::Headless(HeadlessError::InvalidModel(report))) => {
            eprintln!("{report}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}
