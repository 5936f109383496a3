use clap::*;
use msav::libs::alignment::{is_gap, Alignment};
use msav::libs::coord::RowMapper;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("coord")
        .about("Convert between visible, alignment and sequence positions")
        .after_help(
            r###"
Converts positions of one row between the three coordinate spaces of the viewer:

* visible - on-screen column, with globally blank columns hidden
* global  - column of the alignment
* seq     - position in the row's sequence with gaps removed

All positions are 0-based. The output is a TSV with the columns `visible`, `global` and `seq`,
one line per query in command-line order. `NA` marks a value that doesn't exist, e.g. the sequence position of a gap.

Examples:
1. What does the mouse point at in column 10:
   msav coord aln.fa --row seq1 --visible 10

2. Where is residue 42 drawn:
   msav coord aln.fa --row seq1 --seq 42

3. Several queries at once:
   msav coord aln.fa --row seq1 --global 0 --global 5 --global 9

4. Mixed queries keep their order:
   msav coord aln.fa --row seq1 --seq 3 --visible 0 --seq 7

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
            Arg::new("row")
                .long("row")
                .short('r')
                .required(true)
                .num_args(1)
                .help("Name of the row"),
        )
        .arg(
            Arg::new("visible")
                .long("visible")
                .num_args(1)
                .action(ArgAction::Append)
                .value_parser(value_parser!(usize))
                .help("Visible column"),
        )
        .arg(
            Arg::new("global")
                .long("global")
                .num_args(1)
                .action(ArgAction::Append)
                .value_parser(value_parser!(usize))
                .help("Alignment column"),
        )
        .arg(
            Arg::new("seq")
                .long("seq")
                .num_args(1)
                .action(ArgAction::Append)
                .value_parser(value_parser!(usize))
                .help("Position in the ungapped sequence"),
        )
        .group(
            ArgGroup::new("query")
                .args(["visible", "global", "seq"])
                .required(true)
                .multiple(true),
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

#[derive(Debug, Default, PartialEq)]
struct Coords {
    visible: Option<usize>,
    global: Option<usize>,
    seq: Option<usize>,
}

impl Coords {
    fn from_visible(mapper: &RowMapper, visible: usize) -> Self {
        Self {
            visible: Some(visible),
            global: Some(mapper.visible_to_global(visible)),
            seq: mapper.visible_to_seq(visible),
        }
    }

    fn from_global(mapper: &RowMapper, global: usize) -> Self {
        let seq = match mapper.seq().get(global) {
            Some(&b) if !is_gap(b) => Some(mapper.global_to_seq(global)),
            _ => None,
        };
        Self {
            visible: mapper.global_to_visible(global),
            global: Some(global),
            seq,
        }
    }

    fn from_seq(mapper: &RowMapper, pos: usize) -> Self {
        if pos >= mapper.residues() {
            return Self::default();
        }
        // the column right after residue `pos`, minus one
        let global = mapper.seq_to_global(pos + 1) - 1;
        Self {
            visible: mapper.global_to_visible(global),
            global: Some(global),
            seq: Some(pos),
        }
    }

    fn to_tsv(&self) -> String {
        let fmt = |v: Option<usize>| v.map_or("NA".to_string(), |v| v.to_string());
        format!(
            "{}\t{}\t{}",
            fmt(self.visible),
            fmt(self.global),
            fmt(self.seq)
        )
    }
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = msav::writer(args.get_one::<String>("outfile").unwrap())?;
    let infile = args.get_one::<String>("infile").unwrap();
    let name = args.get_one::<String>("row").unwrap();

    let aln = Alignment::from_file(infile)?;
    let row = aln
        .get_row(name)
        .ok_or_else(|| anyhow::anyhow!("row not found in {}: {}", infile, name))?;
    let blanks = aln.blank_columns();
    let mapper = RowMapper::new(row.seq(), &blanks);

    //----------------------------
    // Output
    //----------------------------
    // (position on the command line, answer)
    let mut queries: Vec<(usize, Coords)> = vec![];
    for space in ["visible", "global", "seq"] {
        let (Some(indices), Some(values)) =
            (args.indices_of(space), args.get_many::<usize>(space))
        else {
            continue;
        };
        for (idx, &value) in indices.zip(values) {
            let coords = match space {
                "visible" => Coords::from_visible(&mapper, value),
                "global" => Coords::from_global(&mapper, value),
                _ => Coords::from_seq(&mapper, value),
            };
            queries.push((idx, coords));
        }
    }
    queries.sort_by_key(|(idx, _)| *idx);

    writer.write_fmt(format_args!("visible\tglobal\tseq\n"))?;
    for (_, coords) in &queries {
        writer.write_fmt(format_args!("{}\n", coords.to_tsv()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords_agree() {
        let blanks = vec![2];
        let mapper = RowMapper::new(b"A--TG", &blanks);

        let from_seq = Coords::from_seq(&mapper, 1);
        assert_eq!(from_seq.to_tsv(), "2\t3\t1");
        assert_eq!(Coords::from_global(&mapper, 3), from_seq);
        assert_eq!(Coords::from_visible(&mapper, 2), from_seq);

        // a gap of this row that is not blank
        assert_eq!(Coords::from_global(&mapper, 1).to_tsv(), "1\t1\tNA");
        assert_eq!(Coords::from_global(&mapper, 2).to_tsv(), "NA\t2\tNA");
        assert_eq!(Coords::from_seq(&mapper, 3).to_tsv(), "NA\tNA\tNA");
    }
}
