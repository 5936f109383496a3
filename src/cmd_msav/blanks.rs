use clap::*;
use msav::libs::alignment::Alignment;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("blanks")
        .about("Columns that are a gap in every row")
        .after_help(
            r###"
Prints the 0-based indices of the columns where every row of an aligned FASTA file has a gap
(`-` or `.`). These columns are hidden from the viewer, so they are the difference between
visible and alignment coordinates.

Notes:
* All sequences must have the same length
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'

Examples:
1. List blank columns:
   msav blanks aln.fa

2. Count them:
   msav blanks aln.fa --count

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
            Arg::new("count")
                .long("count")
                .short('c')
                .action(ArgAction::SetTrue)
                .help("Print the width, the visible width and the number of blank columns"),
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
    let infile = args.get_one::<String>("infile").unwrap();

    let aln = Alignment::from_file(infile)?;
    let blanks = aln.blank_columns();

    if args.get_flag("count") {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\n",
            aln.width(),
            aln.visible_width(),
            blanks.len()
        ))?;
    } else {
        for col in blanks {
            writer.write_fmt(format_args!("{}\n", col))?;
        }
    }

    Ok(())
}
