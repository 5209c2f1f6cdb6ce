//! tslua CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rhizome_tslua_core::{
    CompilerOptions, LuaTarget, TranspileOutput, load_config, load_config_in, output_file_name, transpile_path,
};
use rhizome_tslua_lualib::LuaLibImportKind;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tslua")]
#[command(about = "TypeScript to Lua transpiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transpile TypeScript files to Lua
    Build {
        /// Input file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (defaults to next to each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        flags: OptionFlags,
    },

    /// Transpile a file and run it with LuaJIT
    Run {
        /// Input file
        file: PathBuf,

        #[command(flatten)]
        flags: OptionFlags,
    },

    /// Print the transformed Lua AST as JSON
    Ast {
        /// Input file
        file: PathBuf,

        #[command(flatten)]
        flags: OptionFlags,
    },
}

/// Compiler option overrides. Flags win over the config file.
#[derive(Args, Debug, Default)]
struct OptionFlags {
    /// Config file (defaults to tslua.toml in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lua version to target: universal, 5.1, 5.2, 5.3, 5.4 or JIT
    #[arg(long)]
    lua_target: Option<LuaTarget>,

    /// How output reaches lualib helpers: require, inline, always or none
    #[arg(long)]
    lualib_import: Option<LuaLibImportKind>,

    /// Write a .lua.map next to each output
    #[arg(long)]
    source_map: bool,

    /// Embed the source map in the output
    #[arg(long)]
    inline_source_map: bool,

    /// Register a traceback table that maps Lua lines back to TypeScript
    #[arg(long)]
    traceback: bool,

    /// Omit the generated-file header
    #[arg(long)]
    no_header: bool,

    /// Free functions take no self parameter
    #[arg(long)]
    no_implicit_self: bool,
}

impl OptionFlags {
    fn load(&self) -> Result<CompilerOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => load_config_in(".")?,
        };
        self.apply(&mut options);
        Ok(options)
    }

    fn apply(&self, options: &mut CompilerOptions) {
        if let Some(target) = self.lua_target {
            options.lua_target = target;
        }
        if let Some(kind) = self.lualib_import {
            options.lua_lib_import = kind;
        }
        options.source_map |= self.source_map;
        options.inline_source_map |= self.inline_source_map;
        options.source_map_traceback |= self.traceback;
        options.no_header |= self.no_header;
        options.no_implicit_self |= self.no_implicit_self;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tslua=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { files, out_dir, flags } => {
            let options = flags.load()?;
            build(files, out_dir, options).await
        }

        Commands::Run { file, flags } => {
            let mut options = flags.load()?;
            if flags.lua_target.is_none() {
                options.lua_target = LuaTarget::LuaJit;
            }
            let source = std::fs::read_to_string(&file)?;
            let result = tokio::task::spawn_blocking(move || {
                rhizome_tslua_runtime_lua::execute_ts(&source, &options).map_err(|err| err.to_string())
            })
            .await?;
            match result {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("{}", err);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Ast { file, flags } => {
            let options = flags.load()?;
            let output = transpile_path(&file, &options)?;
            report(&output);
            println!("{}", serde_json::to_string_pretty(&output.lua_ast)?);
            Ok(exit_code(!output.has_errors()))
        }
    }
}

/// Transpile every file on the blocking pool, then write the results. Files
/// with errors are still written; the exit code reports them.
async fn build(
    files: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    options: CompilerOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    info!("Building {} file(s)", files.len());
    if let Some(dir) = &out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let tasks: Vec<_> = files
        .into_iter()
        .map(|file| {
            let options = options.clone();
            tokio::task::spawn_blocking(move || {
                let result = transpile_path(&file, &options);
                (file, result)
            })
        })
        .collect();

    let mut success = true;
    for task in tasks {
        let (file, result) = task.await?;
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                error!("{}: {}", file.display(), err);
                success = false;
                continue;
            }
        };
        report(&output);
        success &= !output.has_errors();

        let lua_path = output_path(&file, out_dir.as_deref());
        std::fs::write(&lua_path, &output.lua)?;
        if let Some(map) = &output.source_map {
            let mut map_path = lua_path.clone().into_os_string();
            map_path.push(".map");
            std::fs::write(&map_path, map)?;
        }
        println!("{} -> {}", file.display(), lua_path.display());
    }
    Ok(exit_code(success))
}

fn report(output: &TranspileOutput) {
    for diagnostic in &output.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn output_path(file: &Path, out_dir: Option<&Path>) -> PathBuf {
    let lua_name = PathBuf::from(output_file_name(&file.to_string_lossy()));
    match (out_dir, lua_name.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => lua_name,
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

#[cfg(test)]
mod tests;
