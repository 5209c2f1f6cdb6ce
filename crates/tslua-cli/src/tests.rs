//! Tests for flag parsing and option merging.

use super::*;

fn flags_of(args: &[&str]) -> OptionFlags {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Build { flags, .. } | Commands::Run { flags, .. } | Commands::Ast { flags, .. } => flags,
    }
}

#[test]
fn test_build_arguments() {
    let cli = Cli::try_parse_from(["tslua", "build", "a.ts", "b.ts", "--out-dir", "out"]).unwrap();
    let Commands::Build { files, out_dir, .. } = cli.command else {
        panic!("expected build");
    };
    assert_eq!(files, vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")]);
    assert_eq!(out_dir, Some(PathBuf::from("out")));
}

#[test]
fn test_build_requires_files() {
    assert!(Cli::try_parse_from(["tslua", "build"]).is_err());
}

#[test]
fn test_flags_override_config() {
    let flags = flags_of(&[
        "tslua",
        "build",
        "a.ts",
        "--lua-target",
        "5.3",
        "--lualib-import",
        "inline",
        "--traceback",
        "--no-header",
    ]);
    let mut options = CompilerOptions {
        lua_target: LuaTarget::Lua51,
        source_map: true,
        ..CompilerOptions::default()
    };
    flags.apply(&mut options);
    assert_eq!(options.lua_target, LuaTarget::Lua53);
    assert_eq!(options.lua_lib_import, LuaLibImportKind::Inline);
    assert!(options.source_map_traceback);
    assert!(options.no_header);
    // Unset flags keep the file's value.
    assert!(options.source_map);
}

#[test]
fn test_unknown_target_is_rejected() {
    assert!(Cli::try_parse_from(["tslua", "run", "a.ts", "--lua-target", "6.0"]).is_err());
}

#[test]
fn test_output_path() {
    assert_eq!(output_path(Path::new("src/app.ts"), None), PathBuf::from("src/app.lua"));
    assert_eq!(
        output_path(Path::new("src/app.ts"), Some(Path::new("dist"))),
        PathBuf::from("dist/app.lua")
    );
}
