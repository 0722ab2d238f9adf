use catindex::build::{build_site, load_site};
use catindex::config::Config;
use catindex::generator::{category_issues, category_page, Generators};
use catindex::logging::init_logging;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::error;

fn main() {
    let project_arg = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .help("Directory to search (upwards) for catindex.yaml [default: .]");

    let matches = App::new("catindex")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Log debug output"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(project_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("Output directory [default: {project}/_site]"),
                ),
        )
        .subcommand(
            SubCommand::with_name("categories")
                .about("Lists categories and the index page each one gets")
                .arg(project_arg),
        )
        .get_matches();

    let verbose = matches.is_present("verbose")
        || matches
            .subcommand()
            .1
            .map_or(false, |m| m.is_present("verbose"));
    init_logging(verbose);

    let result = match matches.subcommand() {
        ("build", Some(m)) => build(m),
        ("categories", Some(m)) => categories(m),
        _ => Ok(()),
    };

    if let Err(err) = result {
        error!("{}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn project_dir(m: &ArgMatches) -> PathBuf {
    PathBuf::from(m.value_of("project").unwrap_or("."))
}

fn load_config(m: &ArgMatches, output: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let dir = project_dir(m);
    let config = Config::from_directory(&dir, Path::new("_site"))?;
    let output = match output {
        Some(output) => output.to_owned(),
        None => config.project_root.join("_site"),
    };
    Ok(Config {
        output_directory: output,
        ..config
    })
}

fn build(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(m, m.value_of("output").map(Path::new))?;
    let summary = build_site(&config, &Generators::default())?;
    println!(
        "Wrote {} files ({} posts, {} category pages) to {}",
        summary.files,
        summary.posts,
        summary.pages,
        config.output_directory.display()
    );
    Ok(())
}

fn categories(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(m, None)?;
    let site = load_site(&config)?;
    for (name, posts) in site.categories() {
        let page = category_page(&site, name)?;
        println!("{}\t{}\t{}", name, posts.len(), page.output_path());
    }
    for issue in category_issues(&site) {
        println!("warning: {}", issue);
    }
    Ok(())
}
