use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use apollo_query_builder::OperationKind;
use apollo_query_builder::Options;
use apollo_query_builder::QueryBuilder;
use apollo_query_builder::RequiredArguments;
use apollo_query_builder::SelectionTree;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
struct Args {
    /// Log filter, in `RUST_LOG` syntax. Logs are written to stderr
    #[arg(long = "log", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Prints the unselected selection tree of a schema as JSON
    Generate {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Writes the operation selected by a JSON selection tree
    Serialize {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
        /// The path to the selection tree JSON file, or `-` for stdin
        selection: PathBuf,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Selects dot-separated leaf paths, such as `user.name`, and writes the
    /// resulting operation
    Build {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
        /// Leaf paths to select
        #[arg(long = "select", short = 's', required = true)]
        paths: Vec<String>,
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(clap::Args)]
struct OptionArgs {
    /// YAML or JSON file holding the options
    #[arg(long)]
    config: Option<PathBuf>,
    /// One of query, mutation or subscription
    #[arg(long)]
    operation_type: Option<OperationKind>,
    #[arg(long)]
    operation_name: Option<String>,
    /// Add `__typename` to interface and union fields
    #[arg(long)]
    typename: bool,
    /// Fill required arguments with placeholder values
    #[arg(long)]
    placeholder_arguments: bool,
}

impl OptionArgs {
    fn config_path(&self) -> &Path {
        self.config.as_deref().unwrap_or(Path::new(""))
    }

    fn to_options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => {
                let config = read_input(path)?;
                serde_yaml::from_str(&config)
                    .with_context(|| format!("could not parse options in {}", path.display()))?
            }
            None => Options::default(),
        };
        if let Some(kind) = self.operation_type {
            options.operation_type = kind;
        }
        if let Some(name) = &self.operation_name {
            options.operation_name = Some(name.clone());
        }
        if self.typename {
            options.include_typename = true;
        }
        if self.placeholder_arguments {
            options.required_arguments = RequiredArguments::Placeholder;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = std::env::var("RUST_LOG").ok().unwrap_or(args.log_level);
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter).context("could not parse log")?)
        .with_writer(io::stderr)
        .init();

    let builder = QueryBuilder::default();
    match args.command {
        Command::Generate { schema, options } => {
            check_stdin(&[("schema", schema.as_path()), ("config", options.config_path())])?;
            let sdl = read_input(&schema)?;
            let tree = builder.generate(&sdl, &options.to_options()?)?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Serialize {
            schema,
            selection,
            options,
        } => {
            check_stdin(&[
                ("schema", schema.as_path()),
                ("selection", selection.as_path()),
                ("config", options.config_path()),
            ])?;
            let sdl = read_input(&schema)?;
            let selection: serde_json::Value = serde_json::from_str(&read_input(&selection)?)
                .context("selection tree is not valid JSON")?;
            println!(
                "{}",
                builder.serialize_json(&sdl, &selection, &options.to_options()?)?
            );
        }
        Command::Build {
            schema,
            paths,
            options,
        } => {
            check_stdin(&[("schema", schema.as_path()), ("config", options.config_path())])?;
            let sdl = read_input(&schema)?;
            let mut unknown = Vec::new();
            let query = builder.build(
                &sdl,
                |tree| unknown = select_paths(tree, &paths),
                &options.to_options()?,
            )?;
            if !unknown.is_empty() {
                bail!("no such leaf: {}", unknown.join(", "));
            }
            println!("{query}");
        }
    }
    Ok(())
}

/// Fails when more than one named input is `-`.
fn check_stdin(inputs: &[(&str, &Path)]) -> Result<()> {
    let from_stdin: Vec<&str> = inputs
        .iter()
        .filter(|(_, path)| *path == Path::new("-"))
        .map(|(name, _)| *name)
        .collect();
    if let [first, second, ..] = from_stdin.as_slice() {
        bail!("{first} and {second} cannot both be read from stdin");
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        io::read_to_string(io::stdin()).context("could not read stdin")
    } else {
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
    }
}

/// Selects every dot-separated path, returning the ones that name no leaf.
fn select_paths(tree: &mut SelectionTree, paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter(|path| {
            let keys: Vec<&str> = path.split('.').collect();
            !tree.select(&keys)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use apollo_query_builder::Selection;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn selects_dotted_paths() {
        let mut tree = SelectionTree::new();
        tree.insert(
            "user",
            Selection::Node(
                [
                    ("id".to_string(), Selection::Leaf(false)),
                    ("name".to_string(), Selection::Leaf(false)),
                ]
                .into_iter()
                .collect(),
            ),
        );
        let unknown = select_paths(
            &mut tree,
            &["user.name".to_string(), "user.email".to_string()],
        );
        assert_eq!(unknown, ["user.email"]);
        assert_eq!(tree.get_path(&["user", "name"]), Some(&Selection::Leaf(true)));
        assert_eq!(tree.get_path(&["user", "id"]), Some(&Selection::Leaf(false)));
    }

    #[test]
    fn one_input_at_most_from_stdin() {
        let stdin = Path::new("-");
        let file = Path::new("schema.graphql");
        assert!(check_stdin(&[("schema", stdin), ("config", file)]).is_ok());
        assert!(check_stdin(&[("schema", file), ("config", Path::new(""))]).is_ok());

        let error = check_stdin(&[("schema", stdin), ("config", stdin)]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "schema and config cannot both be read from stdin"
        );
        let error = check_stdin(&[("schema", file), ("selection", stdin), ("config", stdin)])
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "selection and config cannot both be read from stdin"
        );
    }

    #[test]
    fn flags_override_the_config_defaults() {
        let args = Args::parse_from([
            "query-builder",
            "generate",
            "schema.graphql",
            "--operation-type",
            "mutation",
            "--typename",
        ]);
        let Command::Generate { options, .. } = args.command else {
            panic!("expected the generate command");
        };
        let options = options.to_options().unwrap();
        assert_eq!(options.operation_type, OperationKind::Mutation);
        assert!(options.include_typename);
        assert_eq!(options.required_arguments, RequiredArguments::Omit);
    }
}
