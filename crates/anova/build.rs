use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs only needs clap and clap_complete, both build-dependencies.
#[allow(dead_code)]
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("man page directory is writable");

    write_manpages(&cli::Cli::command(), &man_dir);
}

/// One page per command, named `anova-<sub>.1` for subcommands.
fn write_manpages(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();
    let page = dir.join(format!("{name}.1"));

    let mut rendered = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut rendered)
        .unwrap_or_else(|e| panic!("rendering man page for `{name}`: {e}"));
    fs::write(&page, rendered).unwrap_or_else(|e| panic!("writing {}: {e}", page.display()));

    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let sub = sub.clone().name(format!("{name}-{}", sub.get_name()));
        write_manpages(&sub, dir);
    }
}
