use clap::*;
use msav::libs::alignment::Alignment;
use msav::libs::phylo::{LayoutOptions, NodeId, Tree, TreeLayout};
use std::collections::HashSet;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("layout")
        .about("Node positions of a Newick tree")
        .after_help(
            r###"
Lays out the first tree of a Newick file the way the viewer draws it next to the alignment.

Output is a TSV with the columns `id name x y len height`, in preorder:

* id     - node index, parents before children
* x, len - position on the depth axis; the deepest leaf sits at `--width`
* y      - position on the row axis; leaves are centred in rows of `--row-height`
* height - number of leaves under the node

Siblings are ordered by ascending branch length. A collapsed node is drawn as a leaf.

Notes:
* `--collapse` takes a node name or a node id, and can be repeated
* `--no-bl` ignores branch lengths and aligns all leaves
* `--reorder` prints the rows of an aligned FASTA file in the leaf order instead

Examples:
1. Layout with branch lengths:
   msav layout tree.nwk

2. Cladogram with a collapsed clade:
   msav layout tree.nwk --no-bl --collapse Primates

3. Sort an alignment by the tree:
   msav layout tree.nwk --reorder aln.fa

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input Newick file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("row_height")
                .long("row-height")
                .num_args(1)
                .default_value("20")
                .value_parser(value_parser!(f64))
                .help("Distance between two adjacent leaves"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .num_args(1)
                .default_value("200")
                .value_parser(value_parser!(f64))
                .help("Extent of the depth axis"),
        )
        .arg(
            Arg::new("no_bl")
                .long("no-bl")
                .action(ArgAction::SetTrue)
                .help("Ignore branch lengths"),
        )
        .arg(
            Arg::new("collapse")
                .long("collapse")
                .short('c')
                .num_args(1)
                .action(ArgAction::Append)
                .help("Collapse the subtree under this node"),
        )
        .arg(
            Arg::new("reorder")
                .long("reorder")
                .num_args(1)
                .help("Aligned FASTA file to sort by the leaf order"),
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

// Names win over ids, so a leaf labelled "3" is found by its label.
fn resolve_node(tree: &Tree, key: &str) -> anyhow::Result<NodeId> {
    if let Some(id) = tree.get_node_by_name(key) {
        return Ok(id);
    }
    match key.parse::<NodeId>() {
        Ok(id) if tree.get_node(id).is_some() => Ok(id),
        _ => Err(anyhow::anyhow!("node not found: {}", key)),
    }
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = msav::writer(args.get_one::<String>("outfile").unwrap())?;
    let infile = args.get_one::<String>("infile").unwrap();

    let opt = LayoutOptions {
        row_height: *args.get_one::<f64>("row_height").unwrap(),
        tree_width: *args.get_one::<f64>("width").unwrap(),
        show_branch_len: !args.get_flag("no_bl"),
    };

    let trees = Tree::from_file(infile)?;
    let tree = trees
        .first()
        .ok_or_else(|| anyhow::anyhow!("no tree in {}", infile))?;

    let mut collapsed: HashSet<NodeId> = HashSet::new();
    if let Some(keys) = args.get_many::<String>("collapse") {
        for key in keys {
            collapsed.insert(resolve_node(tree, key)?);
        }
    }

    //----------------------------
    // Operating
    //----------------------------
    let layout = TreeLayout::new(tree, &collapsed, &opt)?;

    if let Some(alnfile) = args.get_one::<String>("reorder") {
        let aln = Alignment::from_file(alnfile)?;
        let sorted = aln.reorder_by(&layout.leaf_names());
        for row in sorted.rows() {
            writer.write_fmt(format_args!(
                ">{}\n{}\n",
                row.name(),
                String::from_utf8_lossy(row.seq())
            ))?;
        }
        return Ok(());
    }

    writer.write_fmt(format_args!("id\tname\tx\ty\tlen\theight\n"))?;
    for (id, pos) in layout.iter() {
        let name = tree
            .get_node(id)
            .and_then(|n| n.name.as_deref())
            .unwrap_or("");
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            id, name, pos.x, pos.y, pos.len, pos.height
        ))?;
    }

    Ok(())
}
