use clap::*;
use msav::libs::tiler::{clamp_offset, tile_range, Tiler};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("tiles")
        .about("Canvas tiles to draw for a scroll position")
        .after_help(
            r###"
Prints the pixel offsets of the tiles that have to be drawn along one axis, one per line.

Two modes:

* Window mode (`--scroll`): the block under the scroll position plus one block on each side.
  `--scroll` is the canvas translation, so it is zero or negative once the view has moved.
  Tiles that end at or before zero are dropped.
* Range mode (`--map`, `--offset`, `--extent`): the tiles covering a viewport of `--extent`
  pixels starting at `--offset`, after the offset is clamped into the map.

Examples:
1. Window around a scrolled canvas:
   msav tiles --scroll -1000 --block 256

2. Tiles of a 300px viewport over a 1000px map:
   msav tiles --map 1000 --offset 250 --extent 300 --block 100

"###,
        )
        .arg(
            Arg::new("block")
                .long("block")
                .short('b')
                .num_args(1)
                .default_value("512")
                .value_parser(value_parser!(i64))
                .help("Tile size in pixels"),
        )
        .arg(
            Arg::new("scroll")
                .long("scroll")
                .num_args(1)
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .conflicts_with_all(["map", "offset", "extent"])
                .help("Canvas translation along the axis"),
        )
        .arg(
            Arg::new("unit")
                .long("unit")
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(f64))
                .help("Pixel size of one column or row"),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .num_args(1)
                .value_parser(value_parser!(i64))
                .requires_all(["offset", "extent"])
                .help("Extent of the whole map in pixels"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .num_args(1)
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .requires("map")
                .help("Viewport offset in pixels"),
        )
        .arg(
            Arg::new("extent")
                .long("extent")
                .num_args(1)
                .value_parser(value_parser!(i64))
                .requires("map")
                .help("Viewport extent in pixels"),
        )
        .group(
            ArgGroup::new("mode")
                .args(["scroll", "map"])
                .required(true),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = msav::writer(args.get_one::<String>("outfile").unwrap())?;
    let block_size = *args.get_one::<i64>("block").unwrap();
    if block_size <= 0 {
        return Err(anyhow::anyhow!("--block must be positive, got {}", block_size));
    }

    let offsets: Vec<i64> = if let Some(&scroll) = args.get_one::<f64>("scroll") {
        let unit = *args.get_one::<f64>("unit").unwrap();
        let mut tiler = Tiler::new();
        tiler.blocks(scroll, block_size, unit).to_vec()
    } else {
        let map = *args.get_one::<i64>("map").unwrap();
        let offset = *args.get_one::<i64>("offset").unwrap();
        let extent = *args.get_one::<i64>("extent").unwrap();
        tracing::debug!(
            clamped = clamp_offset(map, offset, extent),
            "viewport offset"
        );
        tile_range(map, block_size, offset, extent)
    };

    for offset in offsets {
        writer.write_fmt(format_args!("{}\n", offset))?;
    }

    Ok(())
}
