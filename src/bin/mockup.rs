use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use mockup::{
    BlendMode, ColorGrade, EngineConfig, FillMode, FsImageSource, MockupEngine, PackId,
    PosterSource, Targets, TemplateConfig, TemplateId, TemplateStore,
};

#[derive(Parser, Debug)]
#[command(name = "mockup", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one poster into one template config.
    Compose(ComposeArgs),
    /// Compose one poster against a pack or a list of stored templates.
    Batch(BatchArgs),
    /// Parse and geometry-check a template config.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (overrides the config file).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Template config JSON (corners + scene size).
    #[arg(long)]
    template: PathBuf,

    /// Scene image.
    #[arg(long)]
    scene: PathBuf,

    /// Poster image.
    #[arg(long)]
    poster: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value = "fill")]
    fill_mode: FillMode,

    #[arg(long, default_value = "none")]
    grade: ColorGrade,

    /// Override the config's blend mode.
    #[arg(long)]
    blend: Option<BlendMode>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Template store JSON; scene paths resolve against its directory.
    #[arg(long)]
    store: PathBuf,

    /// Poster image.
    #[arg(long)]
    poster: PathBuf,

    /// Pack to compose.
    #[arg(long, conflicts_with = "template", required_unless_present = "template")]
    pack: Option<String>,

    /// Template id (repeatable).
    #[arg(long)]
    template: Vec<String>,

    /// Directory receiving one PNG per successful template.
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, default_value = "fill")]
    fill_mode: FillMode,

    /// Override the pack's color grade.
    #[arg(long)]
    grade: Option<ColorGrade>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Template config JSON.
    #[arg(long)]
    template: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn engine_config(args: &EngineArgs) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)?,
        None => EngineConfig::default(),
    };
    if args.threads.is_some() {
        config.worker_threads = args.threads;
    }
    Ok(config)
}

fn read_template_config(path: &Path) -> anyhow::Result<TemplateConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read template config '{}'", path.display()))?;
    TemplateConfig::from_json_str(&text)
        .with_context(|| format!("parse template config '{}'", path.display()))
}

fn read_poster(path: &Path) -> anyhow::Result<PosterSource> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read poster '{}'", path.display()))?;
    Ok(PosterSource::bytes(bytes))
}

fn write_png(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut cfg = read_template_config(&args.template)?;
    if let Some(mode) = args.blend {
        cfg.blend_mode = mode;
    }
    cfg.scene_url = Some(args.scene.to_string_lossy().into_owned());

    let mut store = TemplateStore::default();
    let template = store.import_config(&cfg, "cli", "")?;
    let engine = MockupEngine::new(
        engine_config(&args.engine)?,
        store,
        Arc::new(FsImageSource::new(".")),
    )?;

    let poster = read_poster(&args.poster)?;
    let result = engine.compose(&template.id, &poster, args.fill_mode, args.grade)?;
    write_png(&args.out, &result.image_png)?;
    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        result.size.width,
        result.size.height
    );
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let store = TemplateStore::load_json(&args.store)?;
    let root = args
        .store
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let engine = MockupEngine::new(
        engine_config(&args.engine)?,
        store,
        Arc::new(FsImageSource::new(root)),
    )?;

    let targets = match args.pack {
        Some(pack) => Targets::Pack(PackId::new(pack)),
        None => Targets::Templates(args.template.into_iter().map(TemplateId::new).collect()),
    };
    let poster = read_poster(&args.poster)?;
    let report = engine.compose_many(
        &poster,
        &targets,
        args.fill_mode,
        args.grade,
        &Default::default(),
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for item in &report.items {
        match &item.result {
            Ok(result) => {
                let path = args.out_dir.join(format!("{}.png", item.template_id));
                write_png(&path, &result.image_png)?;
                println!("{}\tok\t{}", item.template_id, path.display());
            }
            Err(e) => println!("{}\terror\t{e}", item.template_id),
        }
    }
    for id in &report.dangling {
        println!("{id}\tskipped\tno such template");
    }

    if report.all_failed() {
        anyhow::bail!("all {} compositions failed", report.items.len());
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let cfg = read_template_config(&args.template)?;
    cfg.validate()
        .with_context(|| format!("invalid template config '{}'", args.template.display()))?;
    let [w, h] = cfg.image_size;
    println!(
        "ok: {} scene {w}x{h}, blend {} at {}, feather {}",
        args.template.display(),
        cfg.blend_mode,
        cfg.blend_alpha,
        cfg.feather_radius
    );
    Ok(())
}
