//! wireup CLI
//!
//! Usage:
//!   wireup [OPTIONS] [FILE]
//!
//! Options:
//!   -e, --environment <FILE>  Environment file with profiles and properties (TOML format)
//!   -s, --strict              Exit non-zero when non-fatal problems were recorded
//!   -h, --help                Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use wireup::{DefinitionReader, DefinitionRegistry, Environment, LoadError, PropertyValue};

#[derive(Parser)]
#[command(name = "wireup")]
#[command(about = "Declarative component definition loader")]
struct Cli {
    /// Input document (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Environment file with active profiles and properties (TOML format)
    #[arg(short, long)]
    environment: Option<PathBuf>,

    /// Exit non-zero when non-fatal problems were recorded
    #[arg(short, long)]
    strict: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let environment = match &cli.environment {
        Some(path) => match Environment::from_file(path) {
            Ok(env) => env,
            Err(e) => {
                eprintln!("Error loading environment '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Environment::new(),
    };

    // Keep the raw source around: syntax errors in the top-level document are
    // rendered against it with full context.
    let (source, origin) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    process::exit(1);
                }
            }
        }
    };

    let mut registry = DefinitionRegistry::new();
    let mut reader = DefinitionReader::new(&mut registry).with_environment(environment);
    let result = match &cli.input {
        Some(path) => reader.load_path(path),
        None => reader.load_str(&source),
    };

    let report = match result {
        Ok(report) => report,
        Err(LoadError::Parse { errors, .. }) => {
            for error in &errors {
                eprintln!("{}", error.format(&source, &origin));
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    print_registry(&registry);

    if !report.is_clean() {
        eprintln!();
        for problem in &report.problems {
            eprintln!("warning: {}", problem);
        }
        if cli.strict {
            process::exit(2);
        }
    }
}

fn print_registry(registry: &DefinitionRegistry) {
    println!("{} component definition(s)", registry.len());
    for name in registry.definition_names() {
        let def = match registry.get(name) {
            Some(def) => def,
            None => continue,
        };
        let mut line = format!("{} = {} ({})", name, def.type_name, def.scope);
        if def.lazy_init {
            line.push_str(" lazy");
        }
        println!("{}", line);
        let aliases = registry.aliases_of(name);
        if !aliases.is_empty() {
            println!("  aliases: {}", aliases.join(", "));
        }
        if let Some(description) = &def.description {
            println!("  # {}", description);
        }
        for property in &def.properties {
            match &property.value {
                PropertyValue::Literal(value) => println!("  {} = {}", property.name, value),
                PropertyValue::Reference(target) => println!("  {} -> {}", property.name, target),
            }
        }
    }
}

fn print_intro() {
    println!(
        r#"wireup - declarative component definition loader

USAGE:
    wireup [OPTIONS] [FILE]
    cat definitions.xml | wireup

OPTIONS:
    -e, --environment <FILE>  Profiles and properties (TOML)
    -s, --strict              Exit non-zero on recorded problems
    -h, --help                Print help

DOCUMENT FORMAT:
    <components>
        <component id="user" type="app::User">
            <property name="uid" value="42"/>
            <property name="repo" ref="repository"/>
        </component>
        <alias name="user" alias="customer"/>
        <import resource="more-definitions.xml"/>
        <components profile="dev">
            <component id="debug-probe" type="app::Probe"/>
        </components>
    </components>

Definitions are printed after loading; problems go to stderr."#
    );
}
