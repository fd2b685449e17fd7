use anyhow::{Context, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use edward::{render_dir, scaffold, serve};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let path = || {
        Arg::with_name("path")
            .help("Path to the site directory. Defaults to the current directory.")
            .index(1)
    };
    let output = || {
        Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("Path to render the site to. Defaults to `build` in the site directory.")
    };
    let verbose = || {
        Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Print progress and debug output")
    };

    let matches = App::new("edward")
        .version(crate_version!())
        .about("A simple static site generator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("new")
                .about("Creates a new site")
                .arg(path())
                .arg(
                    Arg::with_name("template")
                        .short("n")
                        .takes_value(true)
                        .help("Starter set for the new site: `simple` or `blog`"),
                )
                .arg(verbose()),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders an existing site")
                .arg(path())
                .arg(output())
                .arg(verbose()),
        )
        .subcommand(
            SubCommand::with_name("serve")
                .about("Renders a site and serves the output for preview")
                .arg(path())
                .arg(output())
                .arg(
                    Arg::with_name("addr")
                        .long("addr")
                        .takes_value(true)
                        .default_value(serve::DEFAULT_ADDR)
                        .help("Address to listen on"),
                )
                .arg(verbose()),
        )
        .get_matches();

    match matches.subcommand() {
        ("new", Some(m)) => {
            init_logging(m);
            let site_dir = site_dir(m)?;
            scaffold::new_site(&site_dir, m.value_of("template"))?;
            println!("Created a new site in {}", site_dir.display());
        }
        ("render", Some(m)) => {
            init_logging(m);
            let site_dir = site_dir(m)?;
            render(&site_dir, &output_dir(m, &site_dir))?;
        }
        ("serve", Some(m)) => {
            init_logging(m);
            let site_dir = site_dir(m)?;
            let output_dir = output_dir(m, &site_dir);
            render(&site_dir, &output_dir)?;
            serve::serve(&output_dir, m.value_of("addr").unwrap_or(serve::DEFAULT_ADDR))?;
        }
        (command, _) => anyhow::bail!("unknown command '{}'", command),
    }
    Ok(())
}

fn render(site_dir: &Path, output_dir: &Path) -> Result<()> {
    let report = render_dir(site_dir, Some(output_dir))
        .with_context(|| format!("rendering site '{}'", site_dir.display()))?;
    println!(
        "Rendered {} pages ({} posts, {} blog index pages), copied {} files into {}",
        report.pages.len(),
        report.posts,
        report.index_pages.len(),
        report.copied.len(),
        output_dir.display()
    );
    if !report.diagnostics.is_empty() {
        println!("{} files were skipped or copied as-is:", report.diagnostics.len());
        for diagnostic in report.diagnostics.entries() {
            println!("  {}", diagnostic);
        }
    }
    Ok(())
}

fn site_dir(m: &ArgMatches) -> Result<PathBuf> {
    match m.value_of("path") {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => std::env::current_dir().context("finding the current directory"),
    }
}

fn output_dir(m: &ArgMatches, site_dir: &Path) -> PathBuf {
    match m.value_of("output") {
        Some(out) if !out.is_empty() => PathBuf::from(out),
        _ => site_dir.join("build"),
    }
}

fn init_logging(m: &ArgMatches) {
    let default = if m.is_present("verbose") { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
