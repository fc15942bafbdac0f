use anyhow::{anyhow, bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use script_studio::credential::{mask_key, API_KEY_ENTRY};
use script_studio::{export, Config, HookScriptRequest, HookTone, KeyStore, Studio, StudioError};

fn cli() -> Command {
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("Script file to read, or - for stdin")
        .required(true);

    let output = Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Write the result here instead of stdout");

    let refine = Arg::new("refine")
        .short('r')
        .long("refine")
        .value_name("INSTRUCTION")
        .help("Revision request applied after generation (repeatable, in order)")
        .action(ArgAction::Append);

    let command = Command::new("Script Studio")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Style-matched YouTube script drafting")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: search standard locations)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("analyze")
                .about("Analyze a sample script and propose topics")
                .arg(input.clone()),
        )
        .subcommand(
            Command::new("write")
                .about("Analyze a sample, pick a topic and write a full script")
                .arg(input.clone())
                .arg(
                    Arg::new("topic")
                        .short('t')
                        .long("topic")
                        .value_name("N")
                        .help("Which proposed topic to write (1-based)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(refine.clone())
                .arg(output.clone()),
        )
        .subcommand(
            Command::new("shorts")
                .about("Cut short-form ideas from a long-form script")
                .arg(input)
                .arg(
                    Arg::new("select")
                        .short('s')
                        .long("select")
                        .value_name("N")
                        .help("Recommendation to develop (1-based)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(refine)
                .arg(output.clone()),
        )
        .subcommand(
            Command::new("hook")
                .about("Write the opening 30 seconds for a topic")
                .arg(Arg::new("topic").long("topic").value_name("TOPIC").required(true))
                .arg(
                    Arg::new("audience")
                        .long("audience")
                        .value_name("AUDIENCE")
                        .required(true),
                )
                .arg(
                    Arg::new("tone")
                        .long("tone")
                        .value_name("TONE")
                        .help("friendly, professional or energetic")
                        .default_value("friendly"),
                )
                .arg(
                    Arg::new("point")
                        .short('p')
                        .long("point")
                        .value_name("TEXT")
                        .help("Key point to cover (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(output.clone()),
        )
        .subcommand(
            Command::new("long-form")
                .about("Write a five-session long-form script")
                .arg(Arg::new("topic").long("topic").value_name("TOPIC").required(true))
                .arg(output),
        )
        .subcommand(
            Command::new("key")
                .about("Manage the saved API key")
                .subcommand_required(true)
                .subcommand(Command::new("set").arg(Arg::new("value").value_name("KEY").required(true)))
                .subcommand(Command::new("show"))
                .subcommand(Command::new("clear")),
        )
        .subcommand(Command::new("check").about("Validate configuration and service access"));

    #[cfg(feature = "api")]
    let command = command.subcommand(
        Command::new("serve")
            .about("Run the HTTP API")
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .value_parser(clap::value_parser!(u16)),
            ),
    );

    command
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    let level = if matches.get_flag("verbose") {
        "debug".to_string()
    } else {
        config.output.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("script_studio={},warn", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    match matches.subcommand() {
        Some(("analyze", sub)) => run_analyze(&config, sub).await,
        Some(("write", sub)) => run_write(&config, sub).await,
        Some(("shorts", sub)) => run_shorts(&config, sub).await,
        Some(("hook", sub)) => run_hook(&config, sub).await,
        Some(("long-form", sub)) => run_long_form(&config, sub).await,
        Some(("key", sub)) => run_key(&config, sub),
        Some(("check", _)) => run_check(&config).await,
        #[cfg(feature = "api")]
        Some(("serve", sub)) => {
            let mut config = config;
            if let Some(port) = sub.get_one::<u16>("port") {
                config.server.port = *port;
            }
            run_serve(config).await
        }
        _ => unreachable!("subcommand is required"),
    }
}

async fn run_analyze(config: &Config, matches: &ArgMatches) -> Result<()> {
    let script = read_input(matches)?;
    let studio = Studio::from_config(config)?;

    let topics = studio.script.analyze(&script).await.map_err(surface)?;
    let snapshot = studio.script.snapshot().await;

    if let Some(analysis) = &snapshot.analysis {
        println!("Tone:          {}", analysis.tone);
        println!("Audience:      {}", analysis.target_audience);
        println!("Pacing:        {}", analysis.pacing);
        println!("Writing style: {}", analysis.writing_style);
        println!("Themes:        {}", analysis.key_themes.join(", "));
        println!("Strengths:     {}", analysis.strengths.join(", "));
        println!();
    }

    for (i, topic) in topics.iter().enumerate() {
        println!("{}. {} ({:.0}/100)", i + 1, topic.title, topic.virality_score);
        println!("   {}", topic.premise);
        println!("   Why: {}", topic.reason);
    }
    Ok(())
}

async fn run_write(config: &Config, matches: &ArgMatches) -> Result<()> {
    let script = read_input(matches)?;
    let choice = *matches.get_one::<usize>("topic").unwrap_or(&1);
    let studio = Studio::from_config(config)?;

    let topics = studio.script.analyze(&script).await.map_err(surface)?;
    let topic = choice
        .checked_sub(1)
        .and_then(|i| topics.get(i))
        .ok_or_else(|| anyhow!("topic {} not available ({} proposed)", choice, topics.len()))?;
    info!("📝 Selected topic: {}", topic.title);

    studio.script.select_topic(topic.id).await.map_err(surface)?;

    for instruction in matches.get_many::<String>("refine").unwrap_or_default() {
        let version = studio.script.refine(instruction).await.map_err(surface)?;
        info!("Version {} created ({})", version.version_index, version.instruction);
    }

    let snapshot = studio.script.snapshot().await;
    let draft = snapshot
        .draft
        .as_ref()
        .ok_or_else(|| anyhow!("no script was generated"))?;

    let text = export::script_document(&draft.artifact, draft.current_content());
    write_output(config, matches, &draft.artifact.title, "md", &text)
}

async fn run_shorts(config: &Config, matches: &ArgMatches) -> Result<()> {
    let long_form = read_input(matches)?;
    let studio = Studio::from_config(config)?;

    let conversion = studio.shorts.convert(&long_form, None).await.map_err(surface)?;

    let Some(choice) = matches.get_one::<usize>("select") else {
        for (i, rec) in conversion.recommendations.iter().enumerate() {
            println!("{}. {} [{}]", i + 1, rec.title, rec.estimated_views);
            println!("   Hook:  {}", rec.hook);
            println!("   Angle: {}", rec.angle);
            println!();
        }
        return Ok(());
    };

    let index = choice
        .checked_sub(1)
        .ok_or_else(|| anyhow!("recommendations are numbered from 1"))?;
    let selected = studio
        .shorts
        .select(conversion.id, index)
        .await
        .map_err(surface)?;

    for instruction in matches.get_many::<String>("refine").unwrap_or_default() {
        studio
            .shorts
            .refine(conversion.id, instruction)
            .await
            .map_err(surface)?;
    }

    let text = studio.shorts.export(conversion.id).await.map_err(surface)?;
    write_output(config, matches, &selected.title, "txt", &text)
}

async fn run_hook(config: &Config, matches: &ArgMatches) -> Result<()> {
    let tone: HookTone = matches
        .get_one::<String>("tone")
        .map(String::as_str)
        .unwrap_or("friendly")
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let request = HookScriptRequest {
        topic: required(matches, "topic")?,
        target_audience: required(matches, "audience")?,
        tone,
        key_points: matches
            .get_many::<String>("point")
            .unwrap_or_default()
            .cloned()
            .collect(),
    };

    let studio = Studio::from_config(config)?;
    let script = studio.hooks.generate(request).await.map_err(surface)?;
    write_output(config, matches, &script.topic, "txt", &export::hook_script(&script))
}

async fn run_long_form(config: &Config, matches: &ArgMatches) -> Result<()> {
    let topic = required(matches, "topic")?;
    let studio = Studio::from_config(config)?;

    let script = studio.long_form.generate(&topic).await.map_err(surface)?;
    write_output(config, matches, &script.topic, "md", &export::long_form_all(&script))
}

fn run_key(config: &Config, matches: &ArgMatches) -> Result<()> {
    let store = KeyStore::new(config.credentials.key_store_path.clone());

    match matches.subcommand() {
        Some(("set", sub)) => {
            let value = required(sub, "value")?;
            store.set(API_KEY_ENTRY, value.trim())?;
            println!("Saved API key {} to {}", mask_key(value.trim()), store.path().display());
        }
        Some(("show", _)) => match store.get(API_KEY_ENTRY)? {
            Some(key) => println!("{} ({})", mask_key(&key), store.path().display()),
            None => println!("No API key saved in {}", store.path().display()),
        },
        Some(("clear", _)) => {
            if store.remove(API_KEY_ENTRY)? {
                println!("API key removed");
            } else {
                println!("No API key was saved");
            }
        }
        _ => unreachable!("key subcommand is required"),
    }
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    println!("{}", config.summary());

    let studio = Studio::from_config(config)?;
    if !studio.client().is_authenticated() {
        bail!(StudioError::Authentication.user_message());
    }

    if studio.client().is_available().await {
        println!("✅ Generation service reachable");
        Ok(())
    } else {
        warn!("Generation service did not respond");
        bail!("generation service is not reachable")
    }
}

#[cfg(feature = "api")]
async fn run_serve(config: Config) -> Result<()> {
    use script_studio::api::ApiServer;
    use std::sync::Arc;

    let studio = Arc::new(Studio::from_config(&config)?);
    ApiServer::new(studio, Arc::new(config)).start().await
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("--{} is required", name))
}

fn read_input(matches: &ArgMatches) -> Result<String> {
    let source = required(matches, "input")?;
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(&source).with_context(|| format!("failed to read {}", source))
    }
}

/// Print `text`, or write it to `--output` (a bare file name lands in the export directory)
fn write_output(config: &Config, matches: &ArgMatches, title: &str, extension: &str, text: &str) -> Result<()> {
    let Some(target) = matches.get_one::<String>("output") else {
        println!("{}", text);
        return Ok(());
    };

    let mut path = PathBuf::from(target);
    if path.is_dir() {
        path = path.join(export::file_name(title, extension));
    } else if path.parent().map_or(true, |p| p.as_os_str().is_empty()) {
        std::fs::create_dir_all(&config.output.export_dir)?;
        path = config.output.export_dir.join(path);
    }

    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!("💾 Saved to {}", path.display());
    Ok(())
}

/// Log the detail, hand the user the short message
fn surface(err: StudioError) -> anyhow::Error {
    warn!("{}", err);
    anyhow!(err.user_message())
}
