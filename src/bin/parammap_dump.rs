use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use parammap::{LayoutBuilder, RunConfig, SchemaDocument, render_json, render_text};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

struct ParamMapDump {
    config_path: PathBuf,
    output_dir: PathBuf,
    verbosity_level: Option<LevelFilter>,
}

impl ParamMapDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let config_path = PathBuf::from(
            matches
                .get_one::<String>("CONFIG")
                .context("a configuration file is required")?,
        );

        let output_dir = PathBuf::from(
            matches
                .get_one::<String>("output-dir")
                .context("output directory has a default")?,
        );

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        Ok(ParamMapDump {
            config_path,
            output_dir,
            verbosity_level,
        })
    }

    /// Main entry point for `ParamMapDump`
    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let config_text = fs::read_to_string(&self.config_path).with_context(|| {
            format!(
                "failed to read configuration `{}`",
                self.config_path.display()
            )
        })?;
        let config = RunConfig::from_json(&config_text).with_context(|| {
            format!(
                "failed to parse configuration `{}`",
                self.config_path.display()
            )
        })?;

        let base_dir = self.config_path.parent().unwrap_or(Path::new(""));
        let settings = config.settings.resolve_settings();
        let mut builder = LayoutBuilder::new(settings);

        for import in &config.import_xml {
            let path = resolve_import_path(base_dir, &import.file);
            let xml = fs::read_to_string(&path)
                .with_context(|| format!("failed to read schema `{}`", path.display()))?;
            let document = SchemaDocument::parse(&xml)
                .with_context(|| format!("failed to parse schema `{}`", path.display()))?;

            info!(
                "importing {} blocks and {} groups from `{}`",
                import.blocks.len(),
                import.groups.len(),
                path.display()
            );
            builder = builder.import(document, import.blocks.clone(), import.groups.clone());
        }

        let layout = builder.build().context("failed to resolve layout")?;

        let stem = match self.config_path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => bail!(
                "configuration path `{}` has no file name",
                self.config_path.display()
            ),
        };

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create output directory `{}`",
                self.output_dir.display()
            )
        })?;

        let json = render_json(&layout, settings, config.settings.pretty_json)?;
        let json_path = self.output_dir.join(format!("{}.json", stem));
        fs::write(&json_path, json)
            .with_context(|| format!("failed to write `{}`", json_path.display()))?;
        info!("wrote `{}`", json_path.display());

        let text = render_text(&layout, settings);
        if config.settings.text_table_to_console {
            io::stdout()
                .write_all(text.as_bytes())
                .context("failed to write text report to stdout")?;
        } else {
            let text_path = self.output_dir.join(format!("{}.txt", stem));
            fs::write(&text_path, text)
                .with_context(|| format!("failed to write `{}`", text_path.display()))?;
            info!("wrote `{}`", text_path.display());
        }

        Ok(())
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {:?}", e);
            }
        }
    }
}

fn resolve_import_path(base_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

fn main() {
    let matches = Command::new("Parameter map dumper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolves parameter block schemas into byte and SysEx memory maps")
        .arg(
            Arg::new("CONFIG")
                .required(true)
                .help("JSON run configuration naming the schema files, blocks and groups"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .default_value("out")
                .help("Directory receiving `<config>.json` and `<config>.txt`, created if missing."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(indoc!(
                    r#"
                    Sets debug prints level for the application:
                        -v   - info
                        -vv  - debug
                        -vvv - trace
                    NOTE: trace output is only available in debug builds, as it is extremely verbose."#
                )),
        )
        .get_matches();

    let result = ParamMapDump::from_cli_matches(&matches).and_then(|app| app.run());

    if let Err(e) = result {
        eprintln!("{:?}", e);
        exit(1);
    }
}
