extern crate clap;
use clap::*;
use tracing_subscriber::EnvFilter;

mod cmd_msav;

fn main() -> anyhow::Result<()> {
    let app = Command::new("msav")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`msav` - Multiple Sequence Alignment Viewer core")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug events to stderr"),
        )
        .subcommand(cmd_msav::blanks::make_subcommand())
        .subcommand(cmd_msav::coord::make_subcommand())
        .subcommand(cmd_msav::tiles::make_subcommand())
        .subcommand(cmd_msav::layout::make_subcommand())
        .subcommand(cmd_msav::pack::make_subcommand())
        .subcommand(cmd_msav::features::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Alignment columns:
    * blanks   - Columns that are a gap in every row
    * coord    - Convert between visible, alignment and sequence positions

* Viewport:
    * tiles    - Canvas tiles to draw for a scroll position

* Tree:
    * layout   - Node positions of a Newick tree

* Tracks:
    * pack     - Stack intervals into non-overlapping rows
    * features - Place sequence features of one row

Log level is read from RUST_LOG, `-v` forces `debug`.

"###,
        );

    let matches = app.get_matches();
    init_tracing(matches.get_flag("verbose"));

    // Check which subcommand the user ran...
    match matches.subcommand() {
        Some(("blanks", sub_matches)) => cmd_msav::blanks::execute(sub_matches),
        Some(("coord", sub_matches)) => cmd_msav::coord::execute(sub_matches),
        Some(("tiles", sub_matches)) => cmd_msav::tiles::execute(sub_matches),
        Some(("layout", sub_matches)) => cmd_msav::layout::execute(sub_matches),
        Some(("pack", sub_matches)) => cmd_msav::pack::execute(sub_matches),
        Some(("features", sub_matches)) => cmd_msav::features::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
