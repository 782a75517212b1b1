use anyhow::Result;
use clap::{Parser, Subcommand};
use kit::areas::repository::Repository;
use kit::objects::object_type::ObjectType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kit",
    version = "0.1.0",
    about = "A minimal content-addressed version control system",
    long_about = "A minimal version control system built around a content-addressed \
    object store. It is not a drop-in git replacement, but it speaks the same \
    on-disk object formats.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Initialize a new repository")]
    Init {
        #[arg(index = 1, help = "Where to create the repository")]
        path: Option<PathBuf>,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(short = 't', long = "type", value_name = "TYPE", help = "Expected object type to peel to")]
        object_type: Option<String>,
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object database"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "blob", help = "Object type to hash as")]
        object_type: String,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(name = "add", about = "Stage files for the next commit")]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "rm", about = "Unstage files, removing them from the working tree")]
    Rm {
        #[arg(long, help = "Only remove from the index, keep the files")]
        cached: bool,
        #[arg(index = 1, required = true, help = "Files or directories to unstage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "commit", about = "Record the staged snapshot as a commit")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "checkout", about = "Materialize a commit into an empty directory")]
    Checkout {
        #[arg(index = 1, help = "The commit or tree to materialize")]
        revision: String,
        #[arg(index = 2, help = "The target directory, empty or absent")]
        target: PathBuf,
    },
    #[command(name = "log", about = "Show the commit history")]
    Log {
        #[arg(index = 1, default_value = "HEAD", help = "The commit to start from")]
        revision: String,
    },
    #[command(name = "ls-tree", about = "List the entries of a tree object")]
    LsTree {
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, default_value = "HEAD", help = "The tree-ish to list")]
        revision: String,
    },
    #[command(name = "ls-files", about = "List the staged paths")]
    LsFiles {
        #[arg(short, long, help = "Show mode, object id and stage per entry")]
        verbose: bool,
    },
    #[command(name = "rev-parse", about = "Resolve a revision name to an object id")]
    RevParse {
        #[arg(short = 't', long = "type", value_name = "TYPE", help = "Peel the result to this type")]
        object_type: Option<String>,
        #[arg(index = 1, help = "The revision to resolve")]
        name: String,
    },
    #[command(name = "show-ref", about = "List references with their resolved ids")]
    ShowRef,
    #[command(name = "tag", about = "List tags or tag an object")]
    Tag {
        #[arg(short, long, help = "Create an annotated tag object")]
        annotate: bool,
        #[arg(short, long, help = "Message for an annotated tag")]
        message: Option<String>,
        #[arg(index = 1, help = "The tag name; omit to list tags")]
        name: Option<String>,
        #[arg(index = 2, default_value = "HEAD", help = "The object to tag")]
        object: String,
    },
}

fn parse_object_type(raw: Option<&str>) -> Result<Option<ObjectType>> {
    raw.map(ObjectType::try_from).transpose()
}

fn open_repository() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::discover(&pwd, Box::new(std::io::stdout()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            Repository::init_at(&path, Box::new(std::io::stdout()))?;
        }
        Commands::CatFile {
            object_type,
            object,
        } => {
            let repository = open_repository()?;
            repository.cat_file(object, parse_object_type(object_type.as_deref())?)?
        }
        Commands::HashObject {
            write,
            object_type,
            file,
        } => {
            let repository = open_repository()?;
            repository.hash_object(file, ObjectType::try_from(object_type.as_str())?, *write)?
        }
        Commands::Add { paths } => open_repository()?.add(paths)?,
        Commands::Rm { cached, paths } => open_repository()?.rm(paths, *cached)?,
        Commands::Commit { message } => open_repository()?.commit(message)?,
        Commands::Checkout { revision, target } => open_repository()?.checkout(revision, target)?,
        Commands::Log { revision } => open_repository()?.log(revision)?,
        Commands::LsTree {
            recursive,
            revision,
        } => open_repository()?.ls_tree(revision, *recursive)?,
        Commands::LsFiles { verbose } => open_repository()?.ls_files(*verbose)?,
        Commands::RevParse { object_type, name } => {
            let repository = open_repository()?;
            repository.rev_parse(name, parse_object_type(object_type.as_deref())?)?
        }
        Commands::ShowRef => open_repository()?.show_ref()?,
        Commands::Tag {
            annotate,
            message,
            name,
            object,
        } => open_repository()?.tag(name.as_deref(), object, *annotate, message.as_deref())?,
    }

    Ok(())
}
