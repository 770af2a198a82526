//! usd-template CLI - capture library metadata and assemble USD import templates.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use usd_template::binding::{resolve, BindingScheme, EnrichmentScheme};
use usd_template::extract::{find_review_image, ExtractOptions, Extractor, NameSource};
use usd_template::host::MemoryGraph;
use usd_template::prelude::{LibraryTag, LogMonitor, MetadataStore, NodeGraph, Settings};
use usd_template::template::{TemplateBuilder, TemplateOptions};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("USD_TEMPLATE_BUILD_DATE");

/// Flags taking a value.
const VALUE_FLAGS: &[&str] = &["--target", "-t", "--schema", "--inputs", "--stage"];

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return ExitCode::SUCCESS;
    }

    let settings = Settings::load();
    let rest = &filtered_args[1..];
    let result = match filtered_args[0] {
        "list" | "l" => cmd_list(rest),
        "plan" | "p" => cmd_plan(rest, &settings),
        "extract" | "x" => cmd_extract(rest, settings),
        "build" | "b" => cmd_build(rest, &settings),
        "thumb" => cmd_thumb(rest),
        "version" | "--version" => {
            println!("usd-template {} ({})", VERSION, BUILD_DATE);
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_help() {
    println!("usd-template {} - USD import templates from library metadata", VERSION);
    println!();
    println!("USAGE:");
    println!("    usd-template [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    l, list    <store> [tag]                     List libraries, assets and materials");
    println!("    p, plan    <store> <tag> <source>            Show texture bindings of an asset");
    println!("    x, extract <scene.json> <node> <tag> <store> Capture metadata from a scene");
    println!("    b, build   <store> <tag> [source]            Assemble templates and print the stage");
    println!("    thumb      <dir>                             Show the review image of a folder");
    println!("    version                                      Show version and build date");
    println!("    h, help                                      Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose        Show debug output");
    println!("    -vv, --trace         Show trace output (very verbose)");
    println!("    -q, --quiet          Only show errors");
    println!("    -t, --target <id>    Binding scheme target (default from settings)");
    println!("    --schema <file>      Binding scheme JSON (parameters schema)");
    println!("    --inputs <file>      Enrichment scheme JSON (inputs schema)");
    println!("    --stage <path>       Stage network for templates");
    println!("    --extra              Add derived extra surface textures");
    println!("    --displacement       Add derived displacement textures");
    println!("    --no-displacement    Skip derived displacement textures");
    println!("    --execute            Execute the USD ROP and remove the template");
    println!("    --keep               Keep templates between assets");
    println!("    --sidecar            Name assets from sidecar JSON records");
    println!("    --no-thumbs          Skip review image discovery");
    println!();
    println!("EXAMPLES:");
    println!("    usd-template list assets_metadata.json KB");
    println!("    usd-template plan assets_metadata.json KB /lib/kb/geo/crate.bgeo.sc --extra");
    println!("    usd-template extract scene.json /obj/geo1/merge1 MS assets_metadata.json --sidecar");
    println!("    usd-template -v build assets_metadata.json KB --keep");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides -v/-vv/-q");
    println!("    - Defaults are read from the usd-template settings.json in the config dir");
}

/// Positional arguments: everything that is not a flag or a flag value.
fn positionals<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip = false;
    for &arg in args {
        if skip {
            skip = false;
        } else if VALUE_FLAGS.contains(&arg) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(arg);
        }
    }
    out
}

fn has_flag(args: &[&str], flag: &str) -> bool {
    args.iter().any(|&a| a == flag)
}

fn flag_value<'a>(args: &[&'a str], names: &[&str]) -> Option<&'a str> {
    args.windows(2)
        .find(|w| names.contains(&w[0]))
        .map(|w| w[1])
}

fn require_args<'a>(args: &[&'a str], count: usize, usage: &str) -> Result<Vec<&'a str>> {
    let pos = positionals(args);
    if pos.len() < count {
        bail!("missing arguments\nUsage: usd-template {}", usage);
    }
    Ok(pos)
}

fn load_schemes(args: &[&str], settings: &Settings) -> Result<(BindingScheme, EnrichmentScheme)> {
    let schema = flag_value(args, &["--schema"])
        .map(PathBuf::from)
        .or_else(|| settings.parameters_schema.clone());
    let inputs = flag_value(args, &["--inputs"])
        .map(PathBuf::from)
        .or_else(|| settings.inputs_schema.clone());
    let bindings = BindingScheme::load_or_builtin(schema.as_deref()).context("loading binding scheme")?;
    let enrichment =
        EnrichmentScheme::load_or_builtin(inputs.as_deref()).context("loading enrichment scheme")?;
    Ok((bindings, enrichment))
}

fn template_options(args: &[&str], settings: &Settings) -> TemplateOptions {
    let mut opts = settings.template_options();
    if let Some(target) = flag_value(args, &["--target", "-t"]) {
        opts.render_target = target.to_string();
    }
    if let Some(stage) = flag_value(args, &["--stage"]) {
        opts.stage_path = stage.to_string();
    }
    if has_flag(args, "--extra") {
        opts.add_extra_textures = true;
    }
    if has_flag(args, "--displacement") {
        opts.add_displacement = true;
    }
    if has_flag(args, "--no-displacement") {
        opts.add_displacement = false;
    }
    if has_flag(args, "--execute") {
        opts.execute_rop = true;
    }
    opts
}

fn open_store(path: &str) -> Result<MetadataStore> {
    MetadataStore::open_existing(path).with_context(|| format!("opening metadata store {}", path))
}

fn cmd_list(args: &[&str]) -> Result<()> {
    let pos = require_args(args, 1, "list <store> [tag]")?;
    let store = open_store(pos[0])?;
    let doc = store.document();

    let tags: Vec<LibraryTag> = match pos.get(1) {
        Some(&t) => vec![LibraryTag::new(t)],
        None => doc.tags().cloned().collect(),
    };
    if tags.is_empty() {
        println!("{}: empty", pos[0]);
        return Ok(());
    }

    for tag in &tags {
        let assets = doc.library(tag)?;
        println!("{} ({} assets)", tag, assets.len());
        for (source, asset) in assets {
            println!("  {}", asset.asset_name);
            println!("    source: {}", source);
            if let Some(thumb) = &asset.thumbnail {
                println!("    thumbnail: {}", thumb);
            }
            for (name, mat) in &asset.materials {
                println!("    {} [{} textures] {}", name, mat.textures.len(), mat.shop_materialpath);
            }
        }
    }
    Ok(())
}

fn cmd_plan(args: &[&str], settings: &Settings) -> Result<()> {
    let pos = require_args(args, 3, "plan <store> <tag> <source> [--target T] [--extra] [--displacement]")?;
    let store = open_store(pos[0])?;
    let tag = LibraryTag::new(pos[1]);
    let asset = store.document().asset(&tag, pos[2])?;

    let (bindings, enrichment) = load_schemes(args, settings)?;
    let opts = template_options(args, settings);
    let slots = bindings.target(&opts.render_target)?;
    let tables = enrichment.library(&tag);

    println!("{} [{}] target {}", asset.asset_name, tag, opts.render_target);
    for (name, mat) in &asset.materials {
        let plan = resolve(&mat.textures, slots, tables, opts.resolve_flags());
        println!("  {}", name);
        for action in &plan.actions {
            let mark = if action.is_synthesized() { "+" } else { " " };
            println!("   {}{:<13} {:<20} {}", mark, action.stage, action.input, action.texture);
        }
        for slot in &plan.skipped {
            println!("   -{:<13} {}", "skipped", slot);
        }
        if let Some(scale) = plan.displacement_scale {
            println!("    displacement scale {}", scale);
        }
    }
    Ok(())
}

fn cmd_extract(args: &[&str], mut settings: Settings) -> Result<()> {
    let pos = require_args(args, 4, "extract <scene.json> <node> <tag> <store> [--sidecar] [--no-thumbs]")?;
    let scene_path = pos[0];
    let text = std::fs::read_to_string(scene_path).with_context(|| format!("reading {}", scene_path))?;
    let mut graph = MemoryGraph::from_scene_json(&text).with_context(|| format!("loading scene {}", scene_path))?;
    let start = graph.require(pos[1])?;
    let tag = LibraryTag::new(pos[2]);

    let mut store = MetadataStore::open(pos[3])?;
    let mut options = ExtractOptions::for_tag(&tag);
    if has_flag(args, "--sidecar") {
        options.name_source = NameSource::Sidecar;
    }
    if has_flag(args, "--no-thumbs") {
        options.thumbnails = false;
    }

    let report = Extractor::new(&mut store, tag)
        .with_options(options)
        .extract(&mut graph, start, &mut LogMonitor::default())?;
    println!("{}", report.metadata_summary());

    settings.add_recent(store.path().to_path_buf());
    settings.save();
    Ok(())
}

fn cmd_build(args: &[&str], settings: &Settings) -> Result<()> {
    let pos = require_args(
        args,
        2,
        "build <store> <tag> [source] [--target T] [--extra] [--displacement] [--execute] [--keep]",
    )?;
    let store = open_store(pos[0])?;
    let tag = LibraryTag::new(pos[1]);
    let (bindings, enrichment) = load_schemes(args, settings)?;
    let opts = template_options(args, settings);
    let stage_path = opts.stage_path.clone();

    let mut graph = MemoryGraph::with_contexts();
    graph.ensure_path(&stage_path, "lopnet")?;
    let mut builder = TemplateBuilder::new(&mut graph, &bindings, &enrichment, opts);

    match pos.get(2) {
        Some(&source) => {
            let asset = store.document().asset(&tag, source)?;
            let template = builder.build(&tag, source, asset)?;
            println!("{} -> {}", template.asset_name, template.output_path);
            for (mat, slot) in template.skipped_slots() {
                println!("  skipped {}.{}", mat, slot);
            }
        }
        None => {
            let remove = settings.remove_template && !has_flag(args, "--keep");
            let report = builder.convert_all(store.document(), &tag, remove, &mut LogMonitor::default())?;
            println!("{}/{} templates built", report.processed, report.total);
        }
    }

    let stage = graph.require(&stage_path)?;
    print!("{}", graph.dump(stage)?);
    Ok(())
}

fn cmd_thumb(args: &[&str]) -> Result<()> {
    let pos = require_args(args, 1, "thumb <dir>")?;
    let dir = Path::new(pos[0]);
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    match find_review_image(dir) {
        Some(p) => println!("{}", p.display()),
        None => println!("no review image in {}", dir.display()),
    }
    Ok(())
}
