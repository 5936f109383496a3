use clap::*;
use msav::libs::pack::{IntervalPacker, PackerConfig};
use std::io::BufRead;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("pack")
        .about("Stack intervals into non-overlapping rows")
        .after_help(
            r###"
Reads intervals and assigns each one the lowest row where it overlaps nothing already placed.
Placed intervals are never moved.

Input is a TSV with the columns `id start end [height]`:

* start and end are a half-open interval `[start, end)`
* height is the number of rows the interval occupies, default 1
* a repeated id keeps the row of its first occurrence

Output is a TSV with the columns `id min_x max_x min_y max_y`, in input order.
Intervals that don't fit below `--max-height` are listed on stderr, as are intervals
reaching within 8 of the ends of the 32-bit range and rectangles taller than 65536 rows.

Examples:
1. Pack feature spans:
   msav pack spans.tsv

2. At most 4 rows:
   msav pack spans.tsv --max-height 3

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input TSV file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("max_height")
                .long("max-height")
                .num_args(1)
                .default_value("10000")
                .value_parser(value_parser!(usize))
                .help("Highest row an interval may start on"),
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

fn parse_interval(line: &str) -> anyhow::Result<(String, i32, i32, usize)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return Err(anyhow::anyhow!(
            "expected at least 3 fields, got {}",
            fields.len()
        ));
    }
    let start = fields[1].trim().parse::<i32>()?;
    let end = fields[2].trim().parse::<i32>()?;
    let height = match fields.get(3) {
        Some(h) => h.trim().parse::<usize>()?,
        None => 1,
    };

    Ok((fields[0].to_string(), start, end, height))
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = msav::writer(args.get_one::<String>("outfile").unwrap())?;
    let infile = args.get_one::<String>("infile").unwrap();
    let config = PackerConfig {
        max_height: *args.get_one::<usize>("max_height").unwrap(),
    };

    let reader = msav::reader(infile)?;
    let mut packer: IntervalPacker<()> = IntervalPacker::new(config);
    let mut unplaced = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (id, start, end, height) = parse_interval(&line)
            .map_err(|e| anyhow::anyhow!("{}:{}: {}", infile, i + 1, e))?;

        if packer.add(&id, start, end, height, ()).is_none() {
            unplaced.push(id);
        }
    }

    for rec in packer.records() {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\n",
            rec.id, rec.min_x, rec.max_x, rec.min_y, rec.max_y
        ))?;
    }

    for id in &unplaced {
        eprintln!("{} not placed", id);
    }

    Ok(())
}
