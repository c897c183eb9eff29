mod config;
mod dates;
mod error;
mod export;
mod import;
mod library;
mod logging;
mod model;
mod scan;
mod search;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use config::Config;
use model::{Contact, Library, LibraryFormat, PhotoKind};

#[derive(Parser, Debug)]
#[command(name = "contact-hub", version, about = "Browse CSV and vCard contact libraries")]
struct Cli {
    /// Configuration file (defaults to <config_dir>/contact-hub/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory scanned for .vcf/.csv files (overrides `library_dir`)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List libraries with their format and contact count
    List(ListArgs),
    /// Show the contacts of one library
    Show(ShowArgs),
    /// Print one contact as plain text
    Card(CardArgs),
    /// Write one contact as a vCard 3.0 card
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// Only libraries of this format (csv or vcard)
    #[arg(long)]
    format: Option<LibraryFormat>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Library file name or title
    library: String,

    /// Fuzzy filter on name and organization
    #[arg(long)]
    filter: Option<String>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct CardArgs {
    library: String,

    /// 1-based position in the (filtered) list
    index: usize,

    #[arg(long)]
    filter: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    library: String,

    index: usize,

    #[arg(long)]
    filter: Option<String>,

    /// Output file, or a directory to write `<name>.vcf` into
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.library_dir = dir;
    }

    // Keep the handle alive until exit or buffered records are lost.
    let _logger = match logging::init_logging(&config.log_level) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    match &config.config_path {
        Some(path) => info!("event=config_load module=config status=ok path={}", path.display()),
        None => info!("event=config_load module=config status=default"),
    }

    if let Some(threads) = config.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("event=thread_pool module=core status=error error={}", err);
        }
    }

    let libraries = scan::load_libraries(&config.library_dir, &config.parse)?;

    match cli.command.unwrap_or(Command::List(ListArgs::default())) {
        Command::List(args) => handle_list(&libraries, &config, args),
        Command::Show(args) => handle_show(&libraries, args),
        Command::Card(args) => handle_card(&libraries, args),
        Command::Export(args) => handle_export(&libraries, args),
    }
}

fn handle_list(libraries: &[Library], config: &Config, args: ListArgs) -> Result<()> {
    let libraries: Vec<&Library> = libraries
        .iter()
        .filter(|library| args.format.map_or(true, |format| library.format == format))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&libraries)?);
        return Ok(());
    }

    if libraries.is_empty() {
        println!("No contact files found in {}", config.library_dir.display());
        return Ok(());
    }

    for library in &libraries {
        println!(
            "{}\t{}\t{} contact(s)",
            library.title(),
            library.format,
            library.contacts.len()
        );
    }
    Ok(())
}

fn handle_show(libraries: &[Library], args: ShowArgs) -> Result<()> {
    let library = find_library(libraries, &args.library)?;
    let contacts = search::filter_contacts(&library.contacts, args.filter.as_deref().unwrap_or(""));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&contacts)?);
        return Ok(());
    }

    for (position, contact) in contacts.iter().enumerate() {
        println!("{:>4}. {}\t{}", position + 1, contact.display_name, contact.subtitle());
    }
    Ok(())
}

fn handle_card(libraries: &[Library], args: CardArgs) -> Result<()> {
    let library = find_library(libraries, &args.library)?;
    let contact = pick_contact(library, args.filter.as_deref(), args.index)?;
    print!("{}", export::summary_text(contact));
    if let Some(source) = contact.photo_source() {
        match contact.photo_kind() {
            Some(PhotoKind::Url) => println!("Photo: {source}"),
            _ => println!("Photo: embedded image ({} bytes)", source.len()),
        }
    }
    Ok(())
}

fn handle_export(libraries: &[Library], args: ExportArgs) -> Result<()> {
    let library = find_library(libraries, &args.library)?;
    let contact = pick_contact(library, args.filter.as_deref(), args.index)?;
    let card = export::to_vcard(contact);

    let Some(output) = args.output else {
        print!("{card}");
        return Ok(());
    };

    let path = if output.is_dir() {
        output.join(export::file_name(contact))
    } else {
        output
    };
    fs::write(&path, card).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported {} to {}", contact.display_name, path.display());
    Ok(())
}

/// Match by exact file name first, then by title, both case-insensitively.
fn find_library<'a>(libraries: &'a [Library], wanted: &str) -> Result<&'a Library> {
    let wanted = wanted.trim();
    libraries
        .iter()
        .find(|library| library.name.eq_ignore_ascii_case(wanted))
        .or_else(|| {
            libraries
                .iter()
                .find(|library| library.title().eq_ignore_ascii_case(wanted))
        })
        .with_context(|| format!("no library named `{wanted}`"))
}

fn pick_contact<'a>(library: &'a Library, filter: Option<&str>, index: usize) -> Result<&'a Contact> {
    let contacts = search::filter_contacts(&library.contacts, filter.unwrap_or(""));
    if index == 0 || index > contacts.len() {
        bail!(
            "index {} is out of range for {} ({} contact(s))",
            index,
            library.name,
            contacts.len()
        );
    }
    Ok(contacts[index - 1])
}
