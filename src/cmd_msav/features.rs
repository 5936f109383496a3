use clap::*;
use msav::libs::alignment::Alignment;
use msav::libs::annotation::{layout_features, read_features};
use msav::libs::coord::RowMapper;
use msav::libs::pack::{IntervalPacker, PackerConfig};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("features")
        .about("Place sequence features of one row")
        .after_help(
            r###"
Maps features given on the ungapped sequence of one row into visible columns of the
alignment, then stacks them into tracks.

Feature input is a TSV with the columns `id start end [label]`, 0-based and half-open on the
sequence with gaps removed.

Output is a TSV with the columns `id label min_x max_x row`, where `[min_x, max_x)` are
visible columns. Features that don't fit below `--max-height` are listed on stderr.

Examples:
1. Domains of one protein:
   msav features aln.fa domains.tsv --row P12345

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input aligned FASTA file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("features")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Feature TSV file"),
        )
        .arg(
            Arg::new("row")
                .long("row")
                .short('r')
                .required(true)
                .num_args(1)
                .help("Name of the row the features belong to"),
        )
        .arg(
            Arg::new("max_height")
                .long("max-height")
                .num_args(1)
                .default_value("10000")
                .value_parser(value_parser!(usize))
                .help("Highest track a feature may be placed on"),
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
    //----------------------------
    // Args
    //----------------------------
    let mut writer = msav::writer(args.get_one::<String>("outfile").unwrap())?;
    let infile = args.get_one::<String>("infile").unwrap();
    let name = args.get_one::<String>("row").unwrap();
    let config = PackerConfig {
        max_height: *args.get_one::<usize>("max_height").unwrap(),
    };

    let aln = Alignment::from_file(infile)?;
    let row = aln
        .get_row(name)
        .ok_or_else(|| anyhow::anyhow!("row not found in {}: {}", infile, name))?;
    let features = read_features(args.get_one::<String>("features").unwrap())?;

    //----------------------------
    // Operating
    //----------------------------
    let blanks = aln.blank_columns();
    let mapper = RowMapper::new(row.seq(), &blanks);
    let mut packer = IntervalPacker::new(config);
    let layout = layout_features(&mapper, &features, &mut packer);

    //----------------------------
    // Output
    //----------------------------
    for placed in &layout.placed {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\n",
            placed.id, placed.label, placed.min_x, placed.max_x, placed.row
        ))?;
    }
    for id in &layout.unplaced {
        eprintln!("{} not placed", id);
    }

    Ok(())
}
